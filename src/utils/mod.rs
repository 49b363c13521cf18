pub(crate) mod jq;
pub(crate) mod timezone;

pub(crate) use jq::{JqError, JqFilter};
pub(crate) use timezone::Timezone;
