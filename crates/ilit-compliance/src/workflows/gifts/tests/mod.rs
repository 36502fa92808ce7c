mod common;
mod routing;
mod sufficiency;
