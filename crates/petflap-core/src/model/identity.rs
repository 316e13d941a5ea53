use serde::Serialize;

/// Identity descriptor of the door, resolved once at coordinator startup
/// and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceIdentity {
    pub name: String,
    pub device_id: u64,
    pub sw_version: String,
    pub serial_number: String,
}
