mod common;
mod composer;
mod evaluation;
