pub mod clinic_api;
