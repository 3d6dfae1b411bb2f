pub mod answer_store;
pub mod attempt_service;
pub mod countdown;
pub mod navigation;
pub mod quiz_api;
pub mod results;
pub mod submission;
