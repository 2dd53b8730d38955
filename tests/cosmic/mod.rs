mod orbit;
mod spacecraft;
