use std::str::FromStr;

use alloy::dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier};
use alloy::json_abi::Function;
use alloy::primitives::{Address, Bytes, FixedBytes, I256, U256};
use serde_json::Value;

use crate::ports::PortError;

/// ABI-encodes `args` for `function`, selector included.
pub fn encode_calldata(function: &Function, args: &[Value]) -> Result<Bytes, PortError> {
    if function.inputs.len() != args.len() {
        return Err(PortError::Validation(format!(
            "{}: argument count mismatch: expected {}, got {}",
            function.name,
            function.inputs.len(),
            args.len()
        )));
    }

    let mut values = Vec::with_capacity(args.len());
    for (param, arg) in function.inputs.iter().zip(args) {
        let ty: DynSolType = param.resolve().map_err(|e| {
            PortError::Validation(format!("unsupported type '{}': {e}", param.ty))
        })?;
        let value = coerce(arg, &ty).map_err(|e| {
            PortError::Validation(format!("arg '{}' of {}: {e}", param.name, function.name))
        })?;
        values.push(value);
    }

    function
        .abi_encode_input(&values)
        .map(Bytes::from)
        .map_err(|e| PortError::Validation(format!("abi encoding failed: {e}")))
}

fn coerce(value: &Value, ty: &DynSolType) -> Result<DynSolValue, String> {
    let text = || {
        value
            .as_str()
            .map(str::to_owned)
            .or_else(|| match value {
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| format!("expected string or number for {ty}"))
    };

    Ok(match ty {
        DynSolType::Bool => DynSolValue::Bool(value.as_bool().ok_or("expected bool")?),
        DynSolType::Uint(bits) => {
            let raw = text()?;
            let parsed = match raw.strip_prefix("0x") {
                Some(hex) => U256::from_str_radix(hex, 16),
                None => U256::from_str(&raw),
            }
            .map_err(|e| format!("invalid uint: {e}"))?;
            if *bits < 256 && parsed.bit_len() > *bits {
                return Err(format!("{parsed} out of range for uint{bits}"));
            }
            DynSolValue::Uint(parsed, *bits)
        }
        DynSolType::Int(bits) => {
            let parsed = I256::from_str(&text()?).map_err(|e| format!("invalid int: {e}"))?;
            if !int_fits(parsed, *bits) {
                return Err(format!("{parsed} out of range for int{bits}"));
            }
            DynSolValue::Int(parsed, *bits)
        }
        DynSolType::Address => {
            let raw = value.as_str().ok_or("expected address string")?;
            DynSolValue::Address(Address::from_str(raw).map_err(|e| format!("invalid address: {e}"))?)
        }
        DynSolType::FixedBytes(size) => {
            let raw = value.as_str().ok_or("expected hex string")?;
            let word = right_pad(raw, *size).map_err(|e| format!("invalid bytes{size}: {e}"))?;
            DynSolValue::FixedBytes(word, *size)
        }
        DynSolType::Bytes => {
            let raw = value.as_str().ok_or("expected hex string")?;
            let bytes = Bytes::from_str(raw).map_err(|e| format!("invalid bytes: {e}"))?;
            DynSolValue::Bytes(bytes.to_vec())
        }
        DynSolType::String => DynSolValue::String(value.as_str().ok_or("expected string")?.to_owned()),
        DynSolType::Array(inner) => DynSolValue::Array(coerce_all(value, inner, None)?),
        DynSolType::FixedArray(inner, size) => {
            DynSolValue::FixedArray(coerce_all(value, inner, Some(*size))?)
        }
        DynSolType::Tuple(types) => {
            let items = value.as_array().ok_or("expected array for tuple")?;
            if items.len() != types.len() {
                return Err(format!(
                    "tuple length mismatch: expected {}, got {}",
                    types.len(),
                    items.len()
                ));
            }
            DynSolValue::Tuple(
                items
                    .iter()
                    .zip(types)
                    .map(|(v, t)| coerce(v, t))
                    .collect::<Result<_, _>>()?,
            )
        }
        other => return Err(format!("type {other} is not supported")),
    })
}

/// Two's complement range check: `-2^(bits-1) <= value < 2^(bits-1)`.
fn int_fits(value: I256, bits: usize) -> bool {
    if bits >= 256 {
        return true;
    }
    let magnitude = value.unsigned_abs();
    let magnitude = if value.is_negative() {
        magnitude - U256::from(1u8)
    } else {
        magnitude
    };
    magnitude.bit_len() < bits
}

fn coerce_all(
    value: &Value,
    inner: &DynSolType,
    fixed_len: Option<usize>,
) -> Result<Vec<DynSolValue>, String> {
    let items = value.as_array().ok_or("expected array")?;
    if let Some(len) = fixed_len {
        if items.len() != len {
            return Err(format!(
                "fixed array length mismatch: expected {len}, got {}",
                items.len()
            ));
        }
    }
    items.iter().map(|v| coerce(v, inner)).collect()
}

fn right_pad(raw: &str, size: usize) -> Result<FixedBytes<32>, String> {
    let bytes = Bytes::from_str(raw).map_err(|e| e.to_string())?;
    if bytes.len() != size {
        return Err(format!("expected {size} bytes, got {}", bytes.len()));
    }
    Ok(FixedBytes::right_padding_from(&bytes))
}
