use std::process::exit;

use rand::prelude::*;

/**
A tool for generating random, syntactically correct Moon-language source
code, for smoke-testing the compiler pipeline by hand.
 */

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("Takes one argument: maximum breadth");
        exit(1)
    }

    let max_breadth: u32 = args[1].parse::<u32>().unwrap();

    let mut gen = SyntaxGenerator::new();
    gen.program(max_breadth);
}

struct SyntaxGenerator {
    rng: ThreadRng,
    next_id: u32,
    structs: Vec<String>,
}

/*
Program => Struct* Impl* Func* Main
Struct => struct Identifier { Member* } ;
Member => public|private let Identifier : Type | func head ;
Func => func Identifier (Params) : Type { Statement* }
Statement => Assign | Write | If | While | Return
*/
impl SyntaxGenerator {
    fn new() -> SyntaxGenerator {
        SyntaxGenerator {
            rng: thread_rng(),
            next_id: 0,
            structs: Vec::new(),
        }
    }

    fn fresh(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }

    fn breadth(&mut self, max: u32) -> u32 {
        self.rng.gen_range(1..=max.max(1))
    }

    fn program(&mut self, max_breadth: u32) {
        for _ in 0..self.breadth(max_breadth) {
            self.structure(max_breadth);
        }
        for _ in 0..self.breadth(max_breadth) {
            self.func(max_breadth);
        }
        self.main(max_breadth);
    }

    fn structure(&mut self, max_breadth: u32) {
        let name = self.fresh("S").to_uppercase();
        println!("struct {} {{", name);
        for _ in 0..self.breadth(max_breadth) {
            let member = self.fresh("m");
            let vis = if self.rng.gen_bool(0.5) {
                "public"
            } else {
                "private"
            };
            println!("    {} let {}: integer;", vis, member);
        }
        println!("}};");
        self.structs.push(name);
    }

    fn func(&mut self, max_breadth: u32) {
        let name = self.fresh("f");
        let param = self.fresh("p");
        println!("func {}({}: integer): integer {{", name, param);
        let local = self.locals_and_statements(max_breadth, &param);
        println!("    return ({} + {});", local, param);
        println!("}}");
    }

    fn main(&mut self, max_breadth: u32) {
        println!("func main(): void {{");
        let local = self.locals_and_statements(max_breadth, "0");
        println!("    write({});", local);
        println!("}}");
    }

    /// Declares a couple of locals and a handful of statements over them;
    /// returns the name of a local the caller can keep using.
    fn locals_and_statements(&mut self, max_breadth: u32, seed: &str) -> String {
        let a = self.fresh("x");
        let b = self.fresh("x");
        println!("    let {}: integer;", a);
        println!("    let {}: integer;", b);
        println!("    {} = {};", a, seed);
        println!("    {} = {};", b, self.rng.gen_range(0..100));
        for _ in 0..self.breadth(max_breadth) {
            match self.rng.gen_range(0..4) {
                0 => println!("    {} = {} + {};", a, a, b),
                1 => println!("    {} = {} * {};", b, b, self.rng.gen_range(1..10)),
                2 => println!(
                    "    if ({} < {}) then {} = {} - {}; else {} = {} + 1;;",
                    a, b, a, b, a, b, b
                ),
                _ => println!("    write({});", b),
            }
        }
        a
    }
}
