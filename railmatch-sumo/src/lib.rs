mod error;
pub mod kpi;
pub mod net;
pub mod plain;
pub mod routes;
pub mod sumocfg;
pub mod util;
pub mod validate;
pub mod vtypes;
pub mod xml;

pub use error::SumoFileError;
