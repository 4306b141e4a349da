#[cfg(test)]
mod lazy_tests {
    use std::collections::hash_map::DefaultHasher;
    use std::collections::BTreeSet;
    use std::fmt::Write as _;
    use std::hash::{Hash, Hasher};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;

    use lazy_fstring as lf;

    use lf::error::{BoxError, LazyError};
    use lf::frame::CallChain;
    use lf::scope::Bindings;
    use lf::value::{Object, Value};
    use lf::{lazy, LazyString, TextLike};
    use pretty_assertions::assert_eq;

    /// Counts renders; optionally fails until switched on.
    #[derive(Debug, Default)]
    struct Probe {
        renders: AtomicUsize,
        broken: AtomicBool,
    }

    impl Probe {
        fn renders(&self) -> usize {
            self.renders.load(Ordering::SeqCst)
        }
    }

    impl Object for Probe {
        fn render(&self) -> Result<String, BoxError> {
            self.renders.fetch_add(1, Ordering::SeqCst);

            if self.broken.load(Ordering::SeqCst) {
                return Err("probe is broken".into());
            }

            Ok("probe".to_string())
        }
    }

    #[derive(Debug)]
    struct Exploding;

    impl Object for Exploding {
        fn render(&self) -> Result<String, BoxError> {
            panic!("must not be rendered");
        }
    }

    /// Shared mutable state whose text reflects its value at render time.
    #[derive(Debug, Default)]
    struct SharedList(Mutex<Vec<i64>>);

    impl Object for SharedList {
        fn render(&self) -> Result<String, BoxError> {
            let items = self.0.lock().map_err(|e| e.to_string())?;
            Ok(format!("{:?}", *items))
        }
    }

    #[test]
    fn test_basic_rendering() {
        let x = 33;
        let s = lazy!("{x} kittens drink milk", x);

        assert_eq!(s, "33 kittens drink milk");
        assert_eq!(s.to_string(), "33 kittens drink milk");
    }

    #[test]
    fn test_nothing_evaluated_before_observation() {
        let probe = Arc::new(Probe::default());
        let s = lazy!("{p}", p = probe.clone());

        assert!(!s.is_evaluated());
        assert_eq!(probe.renders(), 0);

        // Debug never forces.
        let debug = format!("{:?}", s);
        assert!(debug.contains("Unevaluated"), "{}", debug);
        assert_eq!(probe.renders(), 0);

        assert_eq!(s.force().unwrap(), "probe");
        assert!(s.is_evaluated());
        assert_eq!(format!("{:?}", s), "LazyString::Evaluated(\"probe\")");
    }

    #[test]
    fn test_template_without_spans_never_touches_bindings() {
        let s = lazy!("no braces here", boom = Arc::new(Exploding));
        assert_eq!(s.force().unwrap(), "no braces here");

        let escaped = lazy!("{{just}} braces", boom = Arc::new(Exploding));
        assert_eq!(escaped.force().unwrap(), "{just} braces");
    }

    #[test]
    fn test_renders_exactly_once_across_observations() {
        let probe = Arc::new(Probe::default());
        let s = lazy!("{p} and {p}", p = probe.clone());

        for _ in 0..5 {
            assert_eq!(s.force().unwrap(), "probe and probe");
        }
        assert_eq!(s.text_len().unwrap(), 15);
        assert_eq!(s.char_count().unwrap(), 15);
        assert!(s.contains("and").unwrap());
        assert_eq!(s.chars().unwrap().next(), Some('p'));

        // Two spans, one evaluation.
        assert_eq!(probe.renders(), 2);
    }

    #[test]
    fn test_concurrent_first_observers_evaluate_once() {
        let probe = Arc::new(Probe::default());
        let s = lazy!("{p}", p = probe.clone());

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    assert_eq!(s.force().unwrap(), "probe");
                });
            }
        });

        assert_eq!(probe.renders(), 1);
    }

    #[test]
    fn test_mutation_before_observation_is_visible() {
        let cell = Arc::new(SharedList::default());
        let s = lazy!("items: {items}", items = cell.clone());

        cell.0.lock().unwrap().extend([1, 2, 3]);

        assert_eq!(s.force().unwrap(), "items: [1, 2, 3]");

        // The text is fixed once computed.
        cell.0.lock().unwrap().clear();
        assert_eq!(s.force().unwrap(), "items: [1, 2, 3]");
    }

    #[test]
    fn test_snapshot_released_after_evaluation() {
        let probe = Arc::new(Probe::default());
        let s = lazy!("{p}", p = probe.clone());

        assert_eq!(Arc::strong_count(&probe), 2);
        s.force().unwrap();
        assert_eq!(Arc::strong_count(&probe), 1);
    }

    #[test]
    fn test_failure_is_not_cached() {
        let probe = Arc::new(Probe::default());
        probe.broken.store(true, Ordering::SeqCst);

        let s = lazy!("{p}", p = probe.clone());

        let err = s.force().unwrap_err();
        assert!(matches!(err, LazyError::Conversion(_)), "{:?}", err);
        assert_eq!(err.to_string(), "probe is broken");
        assert!(!s.is_evaluated());
        assert_eq!(Arc::strong_count(&probe), 2);

        probe.broken.store(false, Ordering::SeqCst);

        assert_eq!(s.force().unwrap(), "probe");
        assert_eq!(probe.renders(), 2);
    }

    #[test]
    fn test_unknown_name_surfaces_on_observation() {
        let s = lazy!("{nope}");

        assert!(matches!(
            s.force(),
            Err(LazyError::NameResolution { ref name }) if name == "nope"
        ));

        // Display reports the failure as a formatting error.
        let mut buf = String::new();
        assert!(write!(buf, "{}", s).is_err());
        assert!(buf.is_empty());
    }

    fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_comparison_ordering_and_hashing_follow_the_text() {
        let a = lazy!("{v}", v = "apple");
        let b = lazy!("{v}", v = "banana");
        let a2 = lazy!("app{rest}", rest = "le");

        assert_eq!(a, a2);
        assert!(a < b);
        assert_eq!(a, "apple".to_string());
        assert!(a == *"apple");

        assert_eq!(hash_of(&a), hash_of("apple"));

        let sorted: BTreeSet<LazyString> =
            [lazy!("b"), lazy!("a"), lazy!("c")].into_iter().collect();
        let texts: Vec<&str> = sorted.iter().map(|s| s.force().unwrap()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_text_like_accepts_all_text_types() {
        fn describe(text: &dyn TextLike) -> String {
            format!("{} chars", text.char_count().unwrap())
        }

        let owned = String::from("héllo");
        let lazy_text = lazy!("{w}", w = "héllo");

        assert_eq!(describe(&"héllo"), "5 chars");
        assert_eq!(describe(&owned), "5 chars");
        assert_eq!(describe(&lazy_text), "5 chars");
        assert_eq!(lazy_text.text_len().unwrap(), 6);
        assert!(lazy_text.text_eq(&owned).unwrap());
        assert_eq!(lazy_text.to_text().unwrap(), "héllo");
    }

    #[test]
    fn test_primitive_boundaries_need_explicit_conversion() {
        let s = lazy!("{n}", n = 1);

        let err = serde_json::to_string(&s).unwrap_err();
        assert!(err.to_string().contains("not a primitive text value"), "{}", err);

        // Refused before anything is computed.
        assert!(!s.is_evaluated());

        let text: String = String::try_from(s).unwrap();
        assert_eq!(serde_json::to_string(&text).unwrap(), "\"1\"");
    }

    #[test]
    fn test_lazy_value_nested_inside_another() {
        let inner = lazy!("{n}!", n = 3);
        let locals = Bindings::new().with("inner", Value::from(inner));
        let outer = LazyString::from_locals("[{inner}]", locals);

        assert_eq!(outer.into_string().unwrap(), "[3!]");
    }

    #[test]
    fn test_capture_from_call_chain() {
        let mut chain = CallChain::new(Bindings::new().with("site", "docs"));
        chain = chain
            .enter("handler", Bindings::new().with("user", "ada"))
            .unwrap();

        let s = LazyString::new("{user}@{site}", &chain);

        // Later changes to the chain do not reach the snapshot.
        if let Some(frame) = chain.innermost_mut() {
            frame.locals_mut().define("user", "grace");
        }
        chain.globals_mut().define("site", "blog");
        drop(chain);

        assert_eq!(s.force().unwrap(), "ada@docs");
    }

    #[test]
    fn test_oversized_repeat_is_an_error_not_a_crash() {
        let s = lazy!("{s * n}", s = "ab", n = 1e19);

        let err = s.force().unwrap_err();
        assert!(matches!(err, LazyError::Runtime(_)), "{:?}", err);
        assert!(!s.is_evaluated());
    }

    #[test]
    #[should_panic(expected = "could not be materialized")]
    fn test_infallible_comparison_panics_on_failure() {
        let s = lazy!("{missing}");
        let _ = s == "anything";
    }
}
