pub mod checkin_stream_hub;

pub use checkin_stream_hub::CheckInStreamHub;
