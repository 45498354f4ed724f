pub mod console;
pub mod doctor;
pub mod init;
pub mod run;
pub mod schema;
