mod launch;
mod transfers;
