pub(crate) mod dashboard;
pub(crate) mod forecast;
pub(crate) mod health;
pub(crate) mod history;
