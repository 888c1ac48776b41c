//! tests/template_renderer_tests.rs

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::services::template_renderer::{render, render_with};

    #[test]
    fn test_text_without_groups_is_unchanged() {
        let text = "Plain subject, no variants: 100% off!";
        for _ in 0..20 {
            assert_eq!(render(text), text);
        }
    }

    #[test]
    fn test_empty_input_renders_empty() {
        assert_eq!(render(""), "");
    }

    #[test]
    fn test_every_rendering_is_in_cross_product() {
        let allowed: HashSet<&str> = [
            "Hi there!",
            "Hi friend!",
            "Hello there!",
            "Hello friend!",
        ]
        .into_iter()
        .collect();

        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let out = render_with("{Hi|Hello} {there|friend}!", &mut rng);
            assert!(allowed.contains(out.as_str()), "fuera del producto: {}", out);
            seen.insert(out);
        }
        assert_eq!(seen.len(), 4, "no salieron todas las combinaciones");
    }

    #[test]
    fn test_nested_braces_resolve_innermost_only() {
        for _ in 0..50 {
            let out = render("{a|{b|c}}");
            assert!(out == "{a|b}" || out == "{a|c}", "inesperado: {}", out);
        }
    }

    #[test]
    fn test_unclosed_and_empty_groups_are_left_alone() {
        assert_eq!(render("{a|b"), "{a|b");
        assert_eq!(render("x{}y"), "x{}y");
    }

    #[test]
    fn test_empty_alternative_is_allowed() {
        for _ in 0..50 {
            let out = render("Sale{!|}");
            assert!(out == "Sale!" || out == "Sale");
        }
    }
}
