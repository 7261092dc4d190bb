//! Command names and argument validation.
//!
//! Arguments arrive as a positional JSON array. Validation happens here,
//! before a command is queued, so a queued command can always be dispatched.

use serde_json::Value;
use weardata_core::{Codec, DataMap, DataUri, FilterMode, StructuredValue};

use crate::channel::Channel;
use crate::error::{BridgeError, Result};

/// The commands the bridge understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    PutItem,
    GetItems,
    DeleteItems,
    AddListener,
}

impl CommandKind {
    /// Look up a command by name. Legacy names resolve only when
    /// `accept_legacy` is set.
    pub fn parse(name: &str, accept_legacy: bool) -> Option<Self> {
        match name {
            "putItem" => Some(Self::PutItem),
            "getItems" => Some(Self::GetItems),
            "deleteItems" => Some(Self::DeleteItems),
            "addListener" => Some(Self::AddListener),
            "putDataItem" if accept_legacy => Some(Self::PutItem),
            "getDataItems" if accept_legacy => Some(Self::GetItems),
            "deleteDataItems" if accept_legacy => Some(Self::DeleteItems),
            _ => None,
        }
    }

    /// Canonical name, used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::PutItem => "putItem",
            Self::GetItems => "getItems",
            Self::DeleteItems => "deleteItems",
            Self::AddListener => "addListener",
        }
    }
}

/// A validated transport operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Put { uri: DataUri, data: DataMap },
    Get { uri: DataUri, filter: FilterMode },
    Delete { uri: DataUri, filter: FilterMode },
}

impl Command {
    /// Validate `args` for a transport command.
    ///
    /// `AddListener` takes no transport operation; it only checks arity and
    /// yields `None`.
    pub fn parse(kind: CommandKind, args: &[Value], codec: &Codec) -> Result<Option<Command>> {
        let command = match kind {
            CommandKind::PutItem => {
                expect_arity(kind, args, 2, 2, "2")?;
                let uri = uri_arg(kind, args)?;
                let data = codec.decode(&StructuredValue::from(args[1].clone()))?;
                Command::Put { uri, data }
            }
            CommandKind::GetItems => {
                expect_arity(kind, args, 1, 2, "1 or 2")?;
                Command::Get {
                    uri: uri_arg(kind, args)?,
                    filter: filter_arg(kind, args)?,
                }
            }
            CommandKind::DeleteItems => {
                expect_arity(kind, args, 1, 2, "1 or 2")?;
                Command::Delete {
                    uri: uri_arg(kind, args)?,
                    filter: filter_arg(kind, args)?,
                }
            }
            CommandKind::AddListener => {
                expect_arity(kind, args, 0, 0, "0")?;
                return Ok(None);
            }
        };
        Ok(Some(command))
    }
}

/// A command waiting for (or undergoing) dispatch, with the channel that
/// receives its outcome.
pub struct PendingCommand {
    pub kind: CommandKind,
    pub command: Command,
    pub channel: Channel,
}

fn expect_arity(
    kind: CommandKind,
    args: &[Value],
    min: usize,
    max: usize,
    expected: &'static str,
) -> Result<()> {
    if (min..=max).contains(&args.len()) {
        Ok(())
    } else {
        Err(BridgeError::Arity {
            command: kind.name(),
            expected,
            got: args.len(),
        })
    }
}

fn uri_arg(kind: CommandKind, args: &[Value]) -> Result<DataUri> {
    let invalid = |reason: String| BridgeError::InvalidArgument {
        command: kind.name(),
        index: 0,
        reason,
    };
    let text = args[0]
        .as_str()
        .ok_or_else(|| invalid("must be a uri string".to_string()))?;
    DataUri::parse(text).map_err(|e| invalid(e.to_string()))
}

/// Second argument: an integer filter mode. Absent or null means literal.
fn filter_arg(kind: CommandKind, args: &[Value]) -> Result<FilterMode> {
    match args.get(1) {
        None | Some(Value::Null) => Ok(FilterMode::LITERAL),
        // Hosts that only have doubles send 1.0 for PREFIX.
        Some(value) => value
            .as_i64()
            .or_else(|| {
                value
                    .as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            })
            .and_then(|n| i32::try_from(n).ok())
            .map(FilterMode)
            .ok_or_else(|| BridgeError::InvalidArgument {
                command: kind.name(),
                index: 1,
                reason: "must be an integer filter mode".to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use weardata_core::CodecError;

    fn codec() -> Codec {
        Codec::default()
    }

    #[test]
    fn test_command_names() {
        assert_eq!(CommandKind::parse("putItem", false), Some(CommandKind::PutItem));
        assert_eq!(CommandKind::parse("addListener", false), Some(CommandKind::AddListener));
        assert_eq!(CommandKind::parse("getDataItems", false), None);
        assert_eq!(CommandKind::parse("getDataItems", true), Some(CommandKind::GetItems));
        assert_eq!(CommandKind::parse("frobnicate", true), None);
    }

    #[test]
    fn test_parse_put() {
        let args = vec![json!("/a"), json!({"k": 1})];
        let command = Command::parse(CommandKind::PutItem, &args, &codec())
            .unwrap()
            .unwrap();

        let mut expected = DataMap::new();
        expected.put_int("k", 1);
        assert_eq!(
            command,
            Command::Put {
                uri: DataUri::parse("/a").unwrap(),
                data: expected,
            }
        );
    }

    #[test]
    fn test_put_arity() {
        let err = Command::parse(CommandKind::PutItem, &[json!("/a")], &codec()).unwrap_err();
        assert!(matches!(err, BridgeError::Arity { got: 1, .. }));
        assert_eq!(
            err.to_string(),
            "putItem error: invalid arguments (expected 2, got 1)"
        );
    }

    #[test]
    fn test_put_non_object_payload() {
        let args = vec![json!("/a"), json!([1, 2])];
        let err = Command::parse(CommandKind::PutItem, &args, &codec()).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::MalformedArgument(CodecError::NotAnObject { .. })
        ));
    }

    #[test]
    fn test_uri_must_be_string() {
        let err = Command::parse(CommandKind::GetItems, &[json!(5)], &codec()).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidArgument { index: 0, .. }));
    }

    #[test]
    fn test_filter_defaults_to_literal() {
        for args in [vec![json!("/a")], vec![json!("/a"), Value::Null]] {
            let command = Command::parse(CommandKind::DeleteItems, &args, &codec())
                .unwrap()
                .unwrap();
            assert!(matches!(
                command,
                Command::Delete { filter: FilterMode::LITERAL, .. }
            ));
        }
    }

    #[test]
    fn test_unknown_filter_passes_validation() {
        let args = vec![json!("/a"), json!(7)];
        let command = Command::parse(CommandKind::GetItems, &args, &codec())
            .unwrap()
            .unwrap();
        assert!(matches!(command, Command::Get { filter: FilterMode(7), .. }));
    }

    #[test]
    fn test_integral_double_filter_is_accepted() {
        let args = vec![json!("/a"), json!(1.0)];
        let command = Command::parse(CommandKind::DeleteItems, &args, &codec())
            .unwrap()
            .unwrap();
        assert!(matches!(command, Command::Delete { filter: FilterMode::PREFIX, .. }));

        let args = vec![json!("/a"), json!(1.5)];
        let err = Command::parse(CommandKind::GetItems, &args, &codec()).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidArgument { index: 1, .. }));
    }

    #[test]
    fn test_filter_must_be_integer() {
        let args = vec![json!("/a"), json!("prefix")];
        let err = Command::parse(CommandKind::GetItems, &args, &codec()).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidArgument { index: 1, .. }));
    }

    #[test]
    fn test_add_listener_takes_no_arguments() {
        assert!(Command::parse(CommandKind::AddListener, &[], &codec())
            .unwrap()
            .is_none());
        assert!(Command::parse(CommandKind::AddListener, &[json!(1)], &codec()).is_err());
    }
}
