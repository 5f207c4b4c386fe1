pub mod csv_export;
pub mod maintenance;
pub mod tasks;
pub mod weekly;
