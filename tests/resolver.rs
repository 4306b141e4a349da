#[cfg(test)]
mod resolver_tests {
    use lazy_fstring as lf;

    use lf::collector::collect;
    use lf::error::LazyError;
    use lf::frame::{CallChain, LexicalPath};
    use lf::resolver::{enclosing_frames, is_lexical_parent, resolve_enclosing};
    use lf::scope::{Bindings, ScopeSnapshot};
    use lf::LazyString;
    use pretty_assertions::assert_eq;

    fn path(s: &str) -> LexicalPath {
        s.parse().unwrap()
    }

    fn frame_names(chain: &CallChain) -> Vec<String> {
        enclosing_frames(chain)
            .iter()
            .map(|frame| frame.path().map_or("<module>".to_string(), ToString::to_string))
            .collect()
    }

    #[test]
    fn test_lexical_parent_is_segment_wise() {
        assert!(is_lexical_parent(&path("Outer.inner"), &path("Outer")));
        assert!(is_lexical_parent(&path("Outer.inner.deep"), &path("Outer.inner")));
        assert!(!is_lexical_parent(&path("Outer.inner"), &path("Outerx")));
        assert!(!is_lexical_parent(&path("Outer.inner"), &path("Other")));

        // Module-level functions have no lexical parent.
        assert!(!is_lexical_parent(&path("main"), &path("main")));
    }

    #[test]
    fn test_lexical_path_parsing() {
        let p = path("Outer.inner.deep");

        assert_eq!(p.name(), "deep");
        assert_eq!(p.parent(), Some(path("Outer.inner")));
        assert_eq!(p.to_string(), "Outer.inner.deep");
        assert!(path("Outer").is_prefix_of(&p));

        for bad in ["", "a..b", ".a", "a."] {
            let err = bad.parse::<LexicalPath>().unwrap_err();
            assert!(matches!(err, LazyError::InvalidPath(_)), "{:?}", bad);
        }
    }

    #[test]
    fn test_nested_frames_are_found_innermost_first() {
        let chain = CallChain::new(Bindings::new())
            .enter("Outer", Bindings::new().with("a", 1))
            .unwrap()
            .enter("Outer.inner", Bindings::new().with("b", 2))
            .unwrap()
            .enter("Outer.inner.deep", Bindings::new().with("c", 3))
            .unwrap();

        assert_eq!(frame_names(&chain), vec!["Outer.inner", "Outer"]);

        let enclosing = resolve_enclosing(&chain);
        assert!(enclosing[0].contains("b"));
        assert!(enclosing[1].contains("a"));

        let s = LazyString::new("{a}{b}{c}", &chain);
        assert_eq!(s.force().unwrap(), "123");
    }

    #[test]
    fn test_name_bound_in_intermediate_enclosing_function() {
        // `middle` binds nothing, so `x` must come from `Outer` through it.
        let chain = CallChain::new(Bindings::new())
            .enter("Outer", Bindings::new().with("x", "outer x"))
            .unwrap()
            .enter("Outer.middle", Bindings::new())
            .unwrap()
            .enter("Outer.middle.inner", Bindings::new())
            .unwrap();

        let s = LazyString::new("x is {x}", &chain);
        assert_eq!(s.force().unwrap(), "x is outer x");
    }

    #[test]
    fn test_unrelated_caller_breaks_the_chain() {
        let chain = CallChain::new(Bindings::new())
            .enter("Outer", Bindings::new().with("x", 1))
            .unwrap()
            .enter("Unrelated", Bindings::new())
            .unwrap()
            .enter("Outer.inner", Bindings::new())
            .unwrap();

        assert!(frame_names(&chain).is_empty());

        let err = LazyString::new("{x}", &chain).force().unwrap_err();
        assert!(matches!(err, LazyError::NameResolution { .. }), "{:?}", err);
    }

    #[test]
    fn test_module_frame_stops_the_walk() {
        let chain = CallChain::new(Bindings::new().with("g", "global"))
            .enter_module(Bindings::new().with("m", 1))
            .enter("main", Bindings::new().with("l", "local"))
            .unwrap();

        assert!(frame_names(&chain).is_empty());
        assert_eq!(LazyString::new("{l} {g}", &chain).force().unwrap(), "local global");
        assert!(LazyString::new("{m}", &chain).force().is_err());

        // A module-level call site sees its own locals and the globals only.
        let module_site =
            CallChain::new(Bindings::new()).enter_module(Bindings::new().with("m", 1));
        assert!(frame_names(&module_site).is_empty());
        assert_eq!(LazyString::new("{m}", &module_site).force().unwrap(), "1");
    }

    #[test]
    fn test_prefix_only_and_recursive_matches_are_accepted() {
        // Sibling: `Outer.b` calls `Outer.a`; the path test cannot tell it
        // apart from a real enclosing function.
        let siblings = CallChain::new(Bindings::new())
            .enter("Outer", Bindings::new())
            .unwrap()
            .enter("Outer.b", Bindings::new().with("s", "sibling"))
            .unwrap()
            .enter("Outer.a", Bindings::new())
            .unwrap();

        assert_eq!(frame_names(&siblings), vec!["Outer.b", "Outer"]);
        assert_eq!(LazyString::new("{s}", &siblings).force().unwrap(), "sibling");

        let recursive = CallChain::new(Bindings::new())
            .enter("Outer", Bindings::new())
            .unwrap()
            .enter("Outer.inner", Bindings::new().with("depth", 1))
            .unwrap()
            .enter("Outer.inner", Bindings::new().with("depth", 2))
            .unwrap();

        assert_eq!(frame_names(&recursive), vec!["Outer.inner", "Outer"]);
        assert_eq!(LazyString::new("{depth}", &recursive).force().unwrap(), "2");
    }

    #[test]
    fn test_innermost_binding_shadows_outer_ones() {
        let chain = CallChain::new(Bindings::new().with("x", "global").with("g", "only global"))
            .enter("Outer", Bindings::new().with("x", "enclosing").with("e", "only enclosing"))
            .unwrap()
            .enter("Outer.inner", Bindings::new().with("x", "local"))
            .unwrap();

        let s = LazyString::new("{x} / {e} / {g}", &chain);
        assert_eq!(s.force().unwrap(), "local / only enclosing / only global");

        let snapshot = ScopeSnapshot::new(
            collect(&chain).locals,
            resolve_enclosing(&chain),
            chain.globals().clone(),
        );
        assert_eq!(snapshot.depth(), 3);
        assert_eq!(snapshot.tier_of("x"), Some(0));
        assert_eq!(snapshot.tier_of("e"), Some(1));
        assert_eq!(snapshot.tier_of("g"), Some(2));
        assert_eq!(snapshot.tier_of("missing"), None);
    }

    #[test]
    fn test_collect_takes_call_site_and_globals() {
        let mut chain = CallChain::new(Bindings::new().with("g", 1));
        assert!(collect(&chain).locals.is_empty());

        chain = chain
            .enter("f", Bindings::new().with("unused", 0).with("used", 1))
            .unwrap();

        let collected = collect(&chain);
        assert_eq!(collected.locals.len(), 2);
        assert!(collected.globals.contains("g"));

        chain.pop();
        assert_eq!(chain.depth(), 0);
    }
}
