use super::{arg, text_arg};
use crate::{
    function::{
        FunctionError, FunctionSignature, NullPolicy, ReturnTypeInference,
        signature::{IP_OR_STRING, STRING},
    },
    udf::{DomainFunction, FunctionId, UdfBridge},
    value::{ExprType, Value, coerce},
};
use std::net::IpAddr;

pub(super) fn functions() -> Vec<DomainFunction> {
    vec![UdfBridge::adapt(
        FunctionId::new("ip", "cidrmatch"),
        FunctionSignature::new(
            2,
            [IP_OR_STRING, STRING],
            NullPolicy::Any,
            ReturnTypeInference::Fixed(ExprType::Boolean),
        ),
        cidr_match,
    )]
}

fn parse_cidr(text: &str) -> Result<(IpAddr, u32), FunctionError> {
    let invalid = |reason: &str| {
        FunctionError::invalid_argument("cidrmatch", format!("invalid CIDR '{text}': {reason}"))
    };

    let (addr, prefix) = text.trim().split_once('/').ok_or_else(|| invalid("missing '/'"))?;
    let addr: IpAddr = addr.parse().map_err(|_| invalid("bad address"))?;
    let prefix: u32 = prefix.parse().map_err(|_| invalid("bad prefix length"))?;
    let max = if addr.is_ipv4() { 32 } else { 128 };
    if prefix > max {
        return Err(invalid("prefix length too large"));
    }

    Ok((addr, prefix))
}

fn masked(bits: u128, width: u32, prefix: u32) -> u128 {
    if prefix == 0 {
        return 0;
    }
    let mask = u128::MAX << (width - prefix);

    bits & mask
}

/// Whether `ip` falls inside `cidr`. Mixed address families never match.
fn cidr_match(args: &[Value]) -> Result<Value, FunctionError> {
    let ip = coerce(arg("cidrmatch", args, 0)?.clone(), &ExprType::Ip)?.as_ip()?;
    let (network, prefix) = parse_cidr(text_arg("cidrmatch", args, 1)?)?;

    let matched = match (ip, network) {
        (IpAddr::V4(ip), IpAddr::V4(net)) => {
            let (ip, net) = (u128::from(u32::from(ip)), u128::from(u32::from(net)));
            masked(ip, 32, prefix) == masked(net, 32, prefix)
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) => {
            masked(u128::from(ip), 128, prefix) == masked(u128::from(net), 128, prefix)
        }
        _ => false,
    };

    Ok(Value::Boolean(matched))
}
