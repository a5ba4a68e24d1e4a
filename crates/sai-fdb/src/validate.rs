//! FDB attribute validation.

use crate::objects::SwitchObjects;
use crate::types::{FdbAttribute, SaiAttribute};
use log::{trace, warn};
use sai_common::{is_lag_object, is_port_object, SaiError, SaiResult};

/// Checks one decoded attribute against the switch objects.
///
/// The port must be a created LAG or a valid port. Entry types are already
/// constrained by decoding; packet actions are limited to forward, trap, log
/// and drop. Errors carry attribute index 0.
pub fn validate_attribute(attr: &FdbAttribute, objects: &dyn SwitchObjects) -> SaiResult<()> {
    match *attr {
        FdbAttribute::PortId(oid) => {
            if is_lag_object(oid) {
                if !objects.is_lag_created(oid) {
                    warn!("Invalid attribute value for port:{}, LAG not created", oid);
                    return Err(SaiError::invalid_attr_value(0, format!("LAG {} not created", oid)));
                }
            } else if is_port_object(oid) {
                if !objects.is_port_valid(oid) {
                    warn!("Invalid attribute value for port:{}", oid);
                    return Err(SaiError::invalid_attr_value(0, format!("port {} not valid", oid)));
                }
            } else {
                warn!("Invalid attribute value for port:{}", oid);
                return Err(SaiError::invalid_attr_value(
                    0,
                    format!("{:?} is neither a port nor a LAG", oid),
                ));
            }
            Ok(())
        }
        FdbAttribute::Type(_) => Ok(()),
        FdbAttribute::PacketAction(action) => {
            if action.is_fdb_action() {
                Ok(())
            } else {
                warn!(
                    "Invalid attribute value for attribute:{} value:{}",
                    attr.id(),
                    action
                );
                Err(SaiError::invalid_attr_value(
                    0,
                    format!("packet action {} not allowed on FDB entries", action),
                ))
            }
        }
        FdbAttribute::MetaData(metadata) => {
            trace!("FDB Meta Data value {}", metadata);
            Ok(())
        }
    }
}

/// Decodes and validates a raw attribute.
pub fn validate_raw_attribute(
    attr: &SaiAttribute,
    objects: &dyn SwitchObjects,
) -> SaiResult<FdbAttribute> {
    let decoded = FdbAttribute::try_from(attr).map_err(|e| {
        if matches!(e, SaiError::UnknownAttribute { .. }) {
            warn!("Unknown attribute {}", attr.id);
        }
        e
    })?;
    validate_attribute(&decoded, objects)?;
    Ok(decoded)
}

/// Decodes and validates an attribute list.
///
/// A failure is reported against the position of the offending attribute.
pub fn validate_attribute_list(
    attrs: &[SaiAttribute],
    objects: &dyn SwitchObjects,
) -> SaiResult<Vec<FdbAttribute>> {
    attrs
        .iter()
        .enumerate()
        .map(|(index, attr)| {
            validate_raw_attribute(attr, objects).map_err(|e| reindex(e, index))
        })
        .collect()
}

fn reindex(err: SaiError, index: usize) -> SaiError {
    let index = u16::try_from(index).unwrap_or(u16::MAX);
    match err {
        SaiError::InvalidAttributeValue { message, .. } => {
            SaiError::InvalidAttributeValue { index, message }
        }
        SaiError::UnknownAttribute { attr_id, .. } => SaiError::UnknownAttribute { index, attr_id },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::SwitchObjectRegistry;
    use crate::types::{attr_id, FdbEntryType, PacketAction, SaiAttributeValue};
    use pretty_assertions::assert_eq;
    use sai_common::{SaiObjectId, SaiObjectType, SaiStatus};

    fn registry() -> SwitchObjectRegistry {
        let registry = SwitchObjectRegistry::new();
        registry.add_port(SaiObjectId::new(SaiObjectType::Port, 1));
        registry.create_lag(SaiObjectId::new(SaiObjectType::Lag, 1));
        registry
    }

    fn status(result: SaiResult<()>) -> SaiStatus {
        match result {
            Ok(()) => SaiStatus::Success,
            Err(e) => e.to_status(),
        }
    }

    #[test]
    fn test_port_attribute() {
        let objects = registry();
        let check = |oid| status(validate_attribute(&FdbAttribute::PortId(oid), &objects));

        assert_eq!(check(SaiObjectId::new(SaiObjectType::Port, 1)), SaiStatus::Success);
        assert_eq!(check(SaiObjectId::new(SaiObjectType::Lag, 1)), SaiStatus::Success);
        assert_eq!(
            check(SaiObjectId::new(SaiObjectType::Port, 9)),
            SaiStatus::InvalidAttrValue(0)
        );
        assert_eq!(
            check(SaiObjectId::new(SaiObjectType::Lag, 9)),
            SaiStatus::InvalidAttrValue(0)
        );
        assert_eq!(
            check(SaiObjectId::new(SaiObjectType::BridgePort, 1)),
            SaiStatus::InvalidAttrValue(0)
        );
    }

    #[test]
    fn test_action_and_type_attributes() {
        let objects = registry();
        for action in [PacketAction::Forward, PacketAction::Trap, PacketAction::Log, PacketAction::Drop] {
            assert!(validate_attribute(&FdbAttribute::PacketAction(action), &objects).is_ok());
        }
        assert_eq!(
            status(validate_attribute(&FdbAttribute::PacketAction(PacketAction::Copy), &objects)),
            SaiStatus::InvalidAttrValue(0)
        );
        assert!(validate_attribute(&FdbAttribute::Type(FdbEntryType::Static), &objects).is_ok());
        assert!(validate_attribute(&FdbAttribute::MetaData(u32::MAX), &objects).is_ok());
    }

    #[test]
    fn test_unknown_raw_attribute() {
        let objects = registry();
        let raw = SaiAttribute::new(99, SaiAttributeValue::U32(0));
        let err = validate_raw_attribute(&raw, &objects).unwrap_err();
        assert_eq!(err.to_status(), SaiStatus::UnknownAttribute(0));
    }

    #[test]
    fn test_attribute_list_reports_position() {
        let objects = registry();
        let attrs = [
            SaiAttribute::new(attr_id::TYPE, SaiAttributeValue::S32(1)),
            SaiAttribute::new(
                attr_id::PORT_ID,
                SaiAttributeValue::Oid(SaiObjectId::new(SaiObjectType::Port, 1)),
            ),
            SaiAttribute::new(attr_id::PACKET_ACTION, SaiAttributeValue::S32(2)),
        ];
        let err = validate_attribute_list(&attrs, &objects).unwrap_err();
        assert_eq!(err.to_status(), SaiStatus::InvalidAttrValue(2));

        let decoded = validate_attribute_list(&attrs[..2], &objects).unwrap();
        assert_eq!(decoded.len(), 2);
    }
}
