//! The protocol layer implementations.
//!
//! A layer connects the interfaces of its neighbours: it receives byte
//! windows from the layer below, decides their fate, and hands trimmed
//! payloads to the layer above; on the way down it turns send requests into
//! filled buffers of the layer below. Layers never block and never return
//! errors upwards for wire-level problems; a defective packet is logged
//! and dropped where the defect is found.
pub mod ipv4;
