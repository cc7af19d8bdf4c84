use serde_json::Value;

use crate::ports::{AssistError, Callback};

/// One positional argument of a legacy-style variadic call.
pub enum CallArg {
    Value(Value),
    Callback(Callback),
}

impl CallArg {
    pub fn callback(f: impl FnOnce(Result<Value, AssistError>) + Send + 'static) -> Self {
        Self::Callback(Box::new(f))
    }
}

impl From<Value> for CallArg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl std::fmt::Debug for CallArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Callback(_) => f.write_str("Callback"),
        }
    }
}

pub struct SplitArgs {
    pub callback: Option<Callback>,
    pub args: Vec<Value>,
    pub tx_object: Option<Value>,
    pub default_block: Option<Value>,
}

impl std::fmt::Debug for SplitArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SplitArgs")
            .field("callback", &self.callback.is_some())
            .field("args", &self.args)
            .field("tx_object", &self.tx_object)
            .field("default_block", &self.default_block)
            .finish()
    }
}

/// Splits `(args..., txObject?, defaultBlock?, callback?)` given the number
/// of positional inputs the method declares.
///
/// A trailing callback is taken first, so a short argument list never
/// swallows it. After the positional inputs, an object is the transaction
/// object; whatever follows is the default block.
pub fn split_args(all: Vec<CallArg>, expected_inputs: usize) -> SplitArgs {
    let mut rest = all;
    let callback = match rest.pop() {
        Some(CallArg::Callback(cb)) => Some(cb),
        Some(other) => {
            rest.push(other);
            None
        }
        None => None,
    };

    let mut values = rest.into_iter().filter_map(|arg| match arg {
        CallArg::Value(v) => Some(v),
        CallArg::Callback(_) => {
            tracing::warn!("ignoring callback in non-trailing argument position");
            None
        }
    });

    let args: Vec<Value> = values.by_ref().take(expected_inputs).collect();
    let mut tail: Vec<Value> = values.collect();
    let tx_object = match tail.first() {
        Some(v) if v.is_object() => Some(tail.remove(0)),
        _ => None,
    };
    let default_block = if tail.is_empty() {
        None
    } else {
        Some(tail.remove(0))
    };

    SplitArgs {
        callback,
        args,
        tx_object,
        default_block,
    }
}
