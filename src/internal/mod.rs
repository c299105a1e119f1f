pub(crate) mod callback_host;
pub(crate) mod utils;
