//! Benchmarks runtime arithmetic dispatch cost, not constant folding — there
//! is no constant-folding pass in this compiler, so the bodies below use
//! local variables computed at runtime rather than literals, so the measured
//! time reflects actual instruction dispatch.
//!
//! No parser ships with this crate, so both programs are hand-built
//! `ast::File` trees rather than source text.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gosling::ast::{BinOp, Block, Decl, Expr, File, FuncDecl, Stmt};
use gosling::Script;

fn ident(name: &str) -> Expr {
    Expr::Ident(name.to_string())
}

fn add(lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary { op: BinOp::Add, lhs: Box::new(lhs), rhs: Box::new(rhs) }
}

fn define(name: &str, value: Expr) -> Stmt {
    Stmt::Assign { target: ident(name), value, define: true }
}

fn assign(name: &str, value: Expr) -> Stmt {
    Stmt::Assign { target: ident(name), value, define: false }
}

/// `func main() int { x := 1; y := 2; return x + y }`
fn add_two_locals() -> File {
    let body: Block = vec![
        define("x", Expr::IntLit(1)),
        define("y", Expr::IntLit(2)),
        Stmt::Return(Some(add(ident("x"), ident("y")))),
    ];
    File {
        package: "main".to_string(),
        imports: Vec::new(),
        decls: vec![Decl::Func(FuncDecl { name: "main".to_string(), receiver: None, params: Vec::new(), body })],
    }
}

/// `func main() int { x := 1; y := 2; total := 0; for i := 0; i < 1000; i = i + 1 { total = total + (x + y) }; return total }`
fn add_two_loop_1000() -> File {
    let init = Stmt::Assign { target: ident("i"), value: Expr::IntLit(0), define: true };
    let cond = Expr::Binary { op: BinOp::Lt, lhs: Box::new(ident("i")), rhs: Box::new(Expr::IntLit(1000)) };
    let post = assign("i", add(ident("i"), Expr::IntLit(1)));
    let loop_body: Block = vec![assign("total", add(ident("total"), add(ident("x"), ident("y"))))];

    let body: Block = vec![
        define("x", Expr::IntLit(1)),
        define("y", Expr::IntLit(2)),
        define("total", Expr::IntLit(0)),
        Stmt::For { init: Some(Box::new(init)), cond: Some(cond), post: Some(Box::new(post)), body: loop_body },
        Stmt::Return(Some(ident("total"))),
    ];
    File {
        package: "main".to_string(),
        imports: Vec::new(),
        decls: vec![Decl::Func(FuncDecl { name: "main".to_string(), receiver: None, params: Vec::new(), body })],
    }
}

fn run_once(file: File, expected: i64) -> Script {
    let mut script = Script::from_ast(file);
    script.set_max_instructions(0);
    let (result, err) = script.run();
    assert!(err.is_none(), "benchmark program failed: {err:?}");
    let value = result.expect("main should return a value");
    assert_eq!(value.to_string(), expected.to_string());
    script
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("add_two_locals", |b| {
        b.iter(|| {
            let mut script = run_once(add_two_locals(), 3);
            black_box(script.run());
        });
    });

    c.bench_function("add_two_loop_1000", |b| {
        b.iter(|| {
            let mut script = run_once(add_two_loop_1000(), 3000);
            black_box(script.run());
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
