pub(crate) mod space;
pub(crate) mod time;
