pub mod collection_run;
pub mod device;
pub mod inverter_reading;
pub mod meter_reading;

pub use collection_run::{CollectionRun, RunStatus};
pub use device::{Device, DeviceId, DeviceIdentity};
pub use inverter_reading::InverterReading;
pub use meter_reading::MeterReading;
