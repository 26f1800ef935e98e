mod escape;
mod fixtures;
mod scenarios;
