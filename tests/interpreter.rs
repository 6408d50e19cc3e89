#[cfg(test)]
mod interpreter_tests {
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    use treelox as lox;

    use lox::session::{Outcome, Session};

    /// Clonable in-memory sink so a test can keep a handle on the buffer it
    /// hands to the session.
    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture_session() -> (Session, SharedBuf) {
        let buf = SharedBuf::default();
        let session = Session::with_output(Box::new(buf.clone()));

        (session, buf)
    }

    /// Run one source string to completion and return what it printed.
    fn run_ok(source: &str) -> String {
        let (mut session, buf) = capture_session();

        let outcome = session.run(source);
        assert_eq!(outcome, Outcome::Ok, "diagnostics: {:?}", session.diagnostics());

        buf.contents()
    }

    fn run_expect(source: &str, expected: Outcome) -> Vec<String> {
        let (mut session, _buf) = capture_session();

        assert_eq!(session.run(source), expected);

        session.diagnostics().iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_eval_01_arithmetic_and_concatenation() {
        let out = run_ok("print 1 + 2 * 3; print \"ab\" + \"cd\"; print true; print nil;");

        assert_eq!(out, "7\nabcd\ntrue\nnil\n");
    }

    #[test]
    fn test_eval_02_truthiness() {
        // Only nil and false are falsy; 0 and "" are truthy.
        let out = run_ok("print !nil; print !false; print !0; print !\"\";");

        assert_eq!(out, "true\ntrue\nfalse\nfalse\n");
    }

    #[test]
    fn test_eval_03_division_follows_ieee754() {
        let out = run_ok("print 1 / 0; print -1 / 0; print 7 / 2;");

        assert_eq!(out, "inf\n-inf\n3.5\n");
    }

    #[test]
    fn test_eval_04_equality_never_coerces() {
        let out = run_ok("print 1 == \"1\"; print nil == nil; print nil == false;");

        assert_eq!(out, "false\ntrue\nfalse\n");
    }

    #[test]
    fn test_eval_05_logical_operators_return_operand_values() {
        let out = run_ok("print \"hi\" or 2; print nil or \"yes\"; print nil and 1;");

        assert_eq!(out, "hi\nyes\nnil\n");
    }

    #[test]
    fn test_eval_06_mixed_plus_is_a_type_error() {
        let diags = run_expect("print 1 + \"a\";", Outcome::RuntimeError);

        assert_eq!(diags.len(), 1);
        assert!(diags[0].contains("Operands must be two numbers or two strings"));
        assert!(diags[0].contains("[line 1]"));
    }

    #[test]
    fn test_eval_07_shadowing_initializer_reads_outer_value() {
        let out = run_ok("var a = 1; { var a = a + 1; print a; }");

        assert_eq!(out, "2\n");
    }

    #[test]
    fn test_eval_08_closures_capture_the_frame() {
        let out = run_ok(
            "fun makeCounter() {\n\
             \x20 var i = 0;\n\
             \x20 fun inc() { i = i + 1; return i; }\n\
             \x20 return inc;\n\
             }\n\
             var c = makeCounter();\n\
             print c();\n\
             print c();",
        );

        assert_eq!(out, "1\n2\n");
    }

    #[test]
    fn test_eval_09_for_loop_desugaring_runs() {
        let out = run_ok("for (var i = 0; i < 3; i = i + 1) print i;");

        assert_eq!(out, "0\n1\n2\n");
    }

    #[test]
    fn test_eval_10_method_dispatch_with_super() {
        let out = run_ok(
            "class A { greet() { return \"A\"; } }\n\
             class B < A { greet() { return super.greet() + \"B\"; } }\n\
             print B().greet();",
        );

        assert_eq!(out, "AB\n");
    }

    #[test]
    fn test_eval_11_init_always_returns_the_instance() {
        let out = run_ok(
            "class Thing {\n\
             \x20 init() { this.x = 7; return; }\n\
             }\n\
             var t = Thing();\n\
             print t.x;\n\
             print t.init().x;",
        );

        // Direct re-invocation of init also yields the instance.
        assert_eq!(out, "7\n7\n");
    }

    #[test]
    fn test_eval_12_fields_shadow_methods() {
        let out = run_ok(
            "class C { m() { return \"method\"; } }\n\
             var c = C();\n\
             c.m = \"field\";\n\
             print c.m;",
        );

        assert_eq!(out, "field\n");
    }

    #[test]
    fn test_eval_13_arity_mismatch_is_a_runtime_error() {
        let diags = run_expect("fun f(a, b) {} f(1);", Outcome::RuntimeError);

        assert!(diags[0].contains("Expected 2 arguments but got 1"));
    }

    #[test]
    fn test_eval_14_undefined_variable() {
        let diags = run_expect("print nosuch;", Outcome::RuntimeError);

        assert!(diags[0].contains("Undefined variable 'nosuch'"));
    }

    #[test]
    fn test_eval_15_calling_a_non_callable() {
        let diags = run_expect("var x = 1; x();", Outcome::RuntimeError);

        assert!(diags[0].contains("Can only call functions and classes"));
    }

    #[test]
    fn test_eval_16_non_class_superclass() {
        let diags = run_expect("var NotAClass = 1; class B < NotAClass {}", Outcome::RuntimeError);

        assert!(diags[0].contains("Superclass must be a class"));
    }

    #[test]
    fn test_eval_17_static_errors_block_evaluation() {
        let (mut session, buf) = capture_session();

        // Parse error: nothing may run, even the valid leading statement.
        assert_eq!(
            session.run("print \"never\"; var 1 = 2;"),
            Outcome::StaticError
        );
        assert_eq!(buf.contents(), "");

        // Lex error likewise.
        assert_eq!(session.run("print \"never\"; $"), Outcome::StaticError);
        assert_eq!(buf.contents(), "");
    }

    #[test]
    fn test_eval_18_return_without_value_yields_nil() {
        let out = run_ok("fun f() { return; } print f();");

        assert_eq!(out, "nil\n");
    }

    #[test]
    fn test_eval_19_callable_display_forms() {
        let out = run_ok(
            "fun f() {}\n\
             class C {}\n\
             print f;\n\
             print C;\n\
             print C();\n\
             print clock() >= 0;",
        );

        assert_eq!(out, "<fn f>\nC\nC instance\ntrue\n");
    }

    #[test]
    fn test_eval_20_globals_persist_across_runs() {
        let (mut session, buf) = capture_session();

        assert_eq!(session.run("var a = 1;"), Outcome::Ok);
        assert_eq!(session.run("fun twice(x) { return 2 * x; }"), Outcome::Ok);
        assert_eq!(session.run("print twice(a + 2);"), Outcome::Ok);

        assert_eq!(buf.contents(), "6\n");
    }

    #[test]
    fn test_eval_21_a_runtime_error_halts_only_the_current_run() {
        let (mut session, buf) = capture_session();

        assert_eq!(session.run("var a = 1;"), Outcome::Ok);
        assert_eq!(session.run("print missing;"), Outcome::RuntimeError);
        assert_eq!(session.diagnostics().len(), 1);

        // The next run starts clean and still sees earlier globals.
        assert_eq!(session.run("print a;"), Outcome::Ok);
        assert!(session.diagnostics().is_empty());
        assert_eq!(buf.contents(), "1\n");
    }

    #[test]
    fn test_eval_22_runtime_error_unwinds_the_whole_run() {
        let (mut session, buf) = capture_session();

        // The statement before the error printed; the one after never ran.
        assert_eq!(
            session.run("print 1; print missing; print 2;"),
            Outcome::RuntimeError
        );
        assert_eq!(buf.contents(), "1\n");
    }

    #[test]
    fn test_eval_23_closures_from_earlier_runs_stay_resolved() {
        let (mut session, buf) = capture_session();

        // The counter's hop counts were recorded in run 1; later runs must
        // not disturb them.
        assert_eq!(
            session.run(
                "fun makeCounter() {\n\
                 \x20 var i = 0;\n\
                 \x20 fun inc() { i = i + 1; return i; }\n\
                 \x20 return inc;\n\
                 }\n\
                 var c = makeCounter();"
            ),
            Outcome::Ok
        );
        assert_eq!(session.run("var unrelated = 1; print c();"), Outcome::Ok);
        assert_eq!(session.run("print c();"), Outcome::Ok);

        assert_eq!(buf.contents(), "1\n2\n");
    }

    #[test]
    fn test_eval_24_instance_state_is_per_object() {
        let out = run_ok(
            "class Counter {\n\
             \x20 init() { this.n = 0; }\n\
             \x20 bump() { this.n = this.n + 1; return this.n; }\n\
             }\n\
             var a = Counter();\n\
             var b = Counter();\n\
             a.bump(); a.bump();\n\
             print a.bump();\n\
             print b.bump();",
        );

        assert_eq!(out, "3\n1\n");
    }

    #[test]
    fn test_eval_25_bound_methods_remember_their_instance() {
        let out = run_ok(
            "class Person {\n\
             \x20 init(name) { this.name = name; }\n\
             \x20 who() { return this.name; }\n\
             }\n\
             var m = Person(\"maria\").who;\n\
             print m();",
        );

        assert_eq!(out, "maria\n");
    }
}
