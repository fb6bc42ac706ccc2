#![no_main]

use std::any::Any;
use std::sync::{Arc, Mutex};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tessella_history::{Command, CommandError, CommandHistory, CommandResult};

#[derive(Debug, Arbitrary)]
enum Op {
    Push { delta: i8, group: u8, fail: bool },
    Store { delta: i8 },
    Undo,
    Redo,
    MarkClean,
    ResetClean,
    SetCapacity(u8),
    Clear,
}

#[derive(Debug, Arbitrary)]
struct Input {
    capacity: u8,
    ops: Vec<Op>,
}

struct Add {
    state: Arc<Mutex<i64>>,
    delta: i64,
    group: u8,
    fail: bool,
}

impl Command for Add {
    fn execute(&mut self) -> CommandResult {
        if self.fail {
            return Err(CommandError::Other("rejected".into()));
        }
        *self.state.lock().unwrap() += self.delta;
        Ok(())
    }

    fn undo(&mut self) -> CommandResult {
        *self.state.lock().unwrap() -= self.delta;
        Ok(())
    }

    fn label(&self) -> &str {
        "Add"
    }

    fn merge_with(&mut self, other: &dyn Command) -> bool {
        match other.as_any().downcast_ref::<Self>() {
            Some(other) if self.group != 0 && other.group == self.group => {
                self.delta += other.delta;
                true
            }
            _ => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fuzz_target!(|input: Input| {
    let state = Arc::new(Mutex::new(0i64));
    let mut history = CommandHistory::new(usize::from(input.capacity % 16) + 1);

    for op in input.ops {
        match op {
            Op::Push { delta, group, fail } => {
                let cmd = Add {
                    state: state.clone(),
                    delta: i64::from(delta),
                    group: group % 3,
                    fail,
                };
                let len_before = history.len();
                let result = history.push(cmd);
                assert_eq!(result.is_err(), fail);
                if fail {
                    assert!(history.len() <= len_before);
                    assert!(!history.can_redo(), "redo tail survived a push");
                }
            }
            Op::Store { delta } => {
                *state.lock().unwrap() += i64::from(delta);
                history.store(Add {
                    state: state.clone(),
                    delta: i64::from(delta),
                    group: 0,
                    fail: false,
                });
                assert_eq!(history.current_index(), Some(history.len() - 1));
            }
            Op::Undo => {
                if history.can_undo() {
                    let before = history.current_index();
                    history.undo().unwrap();
                    assert_eq!(
                        history.current_index(),
                        before.and_then(|i| i.checked_sub(1))
                    );
                }
            }
            Op::Redo => {
                if history.can_redo() {
                    history.redo().unwrap();
                }
            }
            Op::MarkClean => {
                history.mark_clean();
                assert!(history.is_clean());
            }
            Op::ResetClean => history.reset_clean(),
            Op::SetCapacity(n) => history.set_capacity(usize::from(n % 16) + 1),
            Op::Clear => history.clear(),
        }

        // Post-conditions that must always hold:
        assert!(history.len() <= history.capacity(), "over capacity");
        if let Some(current) = history.current_index() {
            assert!(current < history.len(), "current_index OOB");
        }
        if let Some(clean) = history.clean_index() {
            assert!(clean < history.len(), "clean_index OOB");
        }
        assert_eq!(history.can_undo(), history.current_index().is_some());
        if history.clean_index() == history.current_index() {
            assert!(history.is_clean());
        }
    }
});
