mod common;
mod implicit_intersection;
