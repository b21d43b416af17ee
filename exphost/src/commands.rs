//! Commands this binary publishes to the application.

use crate::command::{CallingConvention, CommandEntry};
use crate::error::CommandError;
use crate::value::{NativeValue, ValueKind};

/// The table handed to [`CommandRegistry::new`](crate::command::CommandRegistry::new)
/// by `main`.
pub static COMMANDS: &[CommandEntry] = &[CommandEntry {
    name: c"hello",
    function: hello,
    convention: CallingConvention::Positional(&[ValueKind::Str]),
    doc: c"Say hello",
}];

/// Greets `name` on stdout and answers `"Hello"`.
pub fn hello(args: &[NativeValue]) -> Result<NativeValue, CommandError> {
    let name = args
        .first()
        .and_then(NativeValue::as_str)
        .ok_or_else(|| CommandError::new("expected a name"))?;
    println!("Hello from the hello function {name}");
    Ok(NativeValue::from("Hello"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandRegistry;

    #[test]
    fn table_is_a_valid_registry() {
        let registry = CommandRegistry::new(COMMANDS).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), ["hello"]);
        assert_eq!(registry.get("hello").unwrap().doc(), "Say hello");
    }

    #[test]
    fn hello_answers_hello() {
        assert_eq!(hello(&["world".into()]), Ok(NativeValue::from("Hello")));
        assert_eq!(hello(&["".into()]), Ok(NativeValue::from("Hello")));
    }

    #[test]
    fn hello_without_a_name_fails() {
        assert!(hello(&[]).is_err());
        assert!(hello(&[NativeValue::Int(1)]).is_err());
    }
}
