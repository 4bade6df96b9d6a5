use eel::Program;
use std::env;

fn main() {
    let args = env::args().collect::<Vec<_>>();

    if args.len() < 2 {
        panic!("No expression passed")
    }

    let p = Program::from_source(&args[1]).expect("Failed to compile expression");
    for bc in p.bytecode() {
        println!("{:?}", bc);
    }
}
