mod dynamics;
mod maneuvers;
