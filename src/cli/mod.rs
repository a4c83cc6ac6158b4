pub mod doctor;
pub mod inspect;
pub mod run;
pub mod search;
