use crate::{
    abi::{
        AbiError,
        FunctionDescriptor,
        Param,
    },
    primitives::{
        checksummed,
        hex,
        Bytes,
    },
};

use alloy_dyn_abi::{
    DynSolType,
    DynSolValue,
};
use serde_json::{
    json,
    Value,
};

fn param_types(params: &[Param]) -> Result<Vec<DynSolType>, AbiError> {
    params
        .iter()
        .map(|param| DynSolType::parse(&param.canonical_type()).map_err(AbiError::from))
        .collect()
}

/// Calldata for `function` with `args` given as text, one per input, e.g.
/// `["0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"]` for `balanceOf(address)`.
pub fn encode_call(function: &FunctionDescriptor, args: &[String]) -> Result<Bytes, AbiError> {
    let types = param_types(&function.inputs)?;
    if types.len() != args.len() {
        return Err(AbiError::Arity {
            expected: types.len(),
            got: args.len(),
        });
    }

    let values = types
        .iter()
        .zip(args)
        .map(|(ty, arg)| ty.coerce_str(arg))
        .collect::<Result<Vec<_>, _>>()?;

    let mut calldata = function.selector().to_vec();
    calldata.extend(DynSolValue::Tuple(values).abi_encode_params());
    Ok(calldata.into())
}

/// Decodes the return data of `function` into one value per output.
pub fn decode_output(function: &FunctionDescriptor, data: &[u8]) -> Result<Vec<DynSolValue>, AbiError> {
    let types = param_types(&function.outputs)?;
    match DynSolType::Tuple(types).abi_decode_params(data)? {
        DynSolValue::Tuple(values) => Ok(values),
        value => Ok(vec![value]),
    }
}

/// JSON rendering of a decoded value. Integers become decimal strings so
/// they survive consumers with 53-bit numbers.
pub fn value_to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(flag) => json!(flag),
        DynSolValue::Int(int, _) => json!(int.to_string()),
        DynSolValue::Uint(uint, _) => json!(uint.to_string()),
        DynSolValue::FixedBytes(word, size) => json!(hex::encode_prefixed(&word[..*size])),
        DynSolValue::Address(address) => json!(checksummed(address)),
        DynSolValue::Bytes(bytes) => json!(hex::encode_prefixed(bytes)),
        DynSolValue::String(text) => json!(text),
        DynSolValue::Array(values) | DynSolValue::FixedArray(values) | DynSolValue::Tuple(values) => {
            Value::Array(values.iter().map(value_to_json).collect())
        }
        other => json!(format!("{other:?}")),
    }
}
