// Gateway protocol subset. See `gateway_protocol.rs`.
pub mod gateway_protocol {
    include!("gateway_protocol.rs");
    include!("gateway_protocol.tonic.rs");
}
