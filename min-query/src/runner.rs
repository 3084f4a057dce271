//! The database seam: run one command document, get one reply document.
//!
//! The query layer never talks to a connection directly. Anything that can
//! execute a `find` command and hand back the server's reply can drive
//! pagination: the official driver (feature `mongodb`), the in-memory
//! `MemoryDatabase` (feature `memory`), or a test double.

use bson::Document;

use crate::error::CommandError;

/// Executes database commands.
///
/// Implementations return the raw reply document. A reply carrying `ok: 0`
/// may be returned as-is; [`MinQuery`](crate::MinQuery) turns it into a
/// [`CommandError`]. Transport failures, timeouts and cancellation are the
/// implementation's business and surface as `Err`.
pub trait CommandRunner {
    /// Run `command` in one round trip and return the reply.
    fn run_command(&self, command: Document) -> Result<Document, CommandError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run_command(&self, command: Document) -> Result<Document, CommandError> {
        (**self).run_command(command)
    }
}

#[cfg(feature = "mongodb")]
mod driver {
    use bson::Document;
    use mongodb::error::{Error, ErrorKind};

    use super::CommandRunner;
    use crate::error::CommandError;

    impl CommandRunner for mongodb::sync::Database {
        fn run_command(&self, command: Document) -> Result<Document, CommandError> {
            Self::run_command(self, command)
                .run()
                .map_err(CommandError::from)
        }
    }

    impl From<Error> for CommandError {
        fn from(err: Error) -> Self {
            match err.kind.as_ref() {
                ErrorKind::Command(cmd) => Self::new(cmd.message.clone())
                    .with_code(cmd.code)
                    .with_code_name(cmd.code_name.clone()),
                _ => Self::new(err.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<Document>>,
    }

    impl CommandRunner for Recorder {
        fn run_command(&self, command: Document) -> Result<Document, CommandError> {
            self.seen.borrow_mut().push(command);
            Ok(doc! { "ok": 1.0 })
        }
    }

    #[test]
    fn test_runner_through_reference() {
        let recorder = Recorder::default();
        let by_ref: &dyn CommandRunner = &recorder;

        let reply = (&by_ref).run_command(doc! { "ping": 1 }).unwrap();
        assert_eq!(reply, doc! { "ok": 1.0 });
        assert_eq!(recorder.seen.borrow().len(), 1);
    }
}
