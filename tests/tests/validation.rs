//! Validation and error-channel scenarios.

use arbor_tests::prelude::*;
use pretty_assertions::assert_eq;

fn coord() -> Node {
    let ctx = Context::new();
    let coord = ctx.composite("coord").unwrap();
    coord
        .add_typed_child("x", 0, "number")
        .unwrap()
        .add_typed_child("y", 0, "number")
        .unwrap();
    coord
}

mod rejected_writes {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("rejected_writes", &coord())
            .step(
                "write_string",
                |node| {
                    node.set_child("x", "ten");
                    Ok(())
                },
                |e| {
                    e.silent()
                        .errors(1)
                        .error("x must be a number")
                        .error_at("coord.x")
                },
            )
            .step(
                "write_number",
                |node| {
                    node.set_child("x", 10);
                    Ok(())
                },
                |e| e.values(1).errors(0).last(vmap! { "x" => 10, "y" => 0 }),
            )
    }

    #[test]
    fn test_rejected_write_keeps_value_and_recovers() {
        scenario().run().unwrap();
    }
}

mod digits {
    use super::*;

    fn display() -> Node {
        let ctx = Context::new();
        let display = ctx.composite("display").unwrap();
        let digit = RangeSpec::new().tag(TypeTag::Integer).min(0.0).max(9.0);
        display.add_range_child("digit", 4, digit).unwrap();
        display
    }

    pub fn scenario() -> Scenario {
        Scenario::new("digits", &display())
            .step(
                "too_big",
                |node| {
                    node.set_child("digit", 12);
                    Ok(())
                },
                |e| e.silent().error("digit must be <= 9"),
            )
            .step(
                "negative",
                |node| {
                    node.set_child("digit", -3);
                    Ok(())
                },
                |e| e.silent().error("digit must be >= 0"),
            )
            .step(
                "fraction",
                |node| {
                    node.set_child("digit", 1.5);
                    Ok(())
                },
                |e| e.silent().error("digit must be a integer"),
            )
            .step(
                "in_range",
                |node| {
                    node.set_child("digit", 7);
                    Ok(())
                },
                |e| e.values(1).errors(0).last(vmap! { "digit" => 7 }),
            )
    }

    #[test]
    fn test_range_limits_digit() {
        scenario().run().unwrap();
    }
}

mod distinct {
    use super::*;

    fn form() -> Node {
        let ctx = Context::new();
        let form = ctx.composite("form").unwrap();
        form.add_typed_child("title", "draft", "string")
            .unwrap()
            .add_child("meta", vmap! { "pinned" => false })
            .unwrap()
            .add_typed_child("tags", Value::List(vec![]), "array")
            .unwrap();
        form
    }

    pub fn scenario() -> Scenario {
        Scenario::new("distinct", &form())
            .step(
                "same_title",
                |node| {
                    node.set_child("title", "draft");
                    Ok(())
                },
                |e| e.silent(),
            )
            .step(
                "same_meta",
                |node| {
                    node.set_child("meta", vmap! { "pinned" => false });
                    Ok(())
                },
                |e| e.values(1),
            )
            .step(
                "same_tags",
                |node| {
                    node.set_child("tags", Value::List(vec![]));
                    Ok(())
                },
                |e| e.values(1),
            )
            .step(
                "new_title",
                |node| {
                    node.set_child("title", "final");
                    Ok(())
                },
                |e| e.values(1),
            )
    }

    #[test]
    fn test_only_scalar_types_are_distinct() {
        scenario().run().unwrap();
    }
}

mod non_termination {
    use super::*;
    use pretty_assertions::assert_eq;

    pub fn scenario() -> Scenario {
        let coord = coord();
        coord
            .define_action("fail", |_, _| Err(Fault::new("cannot")))
            .unwrap();
        Scenario::new("non_termination", &coord)
            .step(
                "many_errors",
                |node| {
                    for bad in ["a", "b", "c"] {
                        node.set_child("y", bad);
                    }
                    node.act("fail", &[])?;
                    Ok(())
                },
                |e| e.errors(4).error("action fail failed: cannot").silent(),
            )
            .step(
                "still_flowing",
                |node| {
                    node.set_child("y", 1);
                    Ok(())
                },
                |e| e.values(1),
            )
            .step(
                "complete",
                |node| {
                    node.complete();
                    Ok(())
                },
                |e| e.completions(1).silent(),
            )
            .step(
                "after_complete",
                |node| {
                    node.set_child("y", 2);
                    node.emit_error("late");
                    node.complete();
                    Ok(())
                },
                |e| e.silent().errors(0).completions(0),
            )
    }

    #[test]
    fn test_errors_never_end_the_subscription() {
        let recorder = scenario().run().unwrap();
        assert_eq!(recorder.completions(), 1);
        assert_eq!(recorder.error_count(), 4);
    }
}

#[test]
fn test_custom_tag_from_resolver() {
    // GIVEN a resolver with an "even" tag
    let resolver = ResolverBuilder::new()
        .register("even", |value, field| match value.as_i64() {
            Some(n) if n % 2 == 0 => None,
            _ => Some(format!("{} must be even", field)),
        })
        .unwrap()
        .build();
    let ctx = Context::with_resolver(Config::default(), resolver);
    let pair = ctx.composite("pair").unwrap();
    pair.add_typed_child("left", 2, "even").unwrap();
    let recorder = Recorder::attach(&pair);

    // WHEN writing odd then even values
    pair.set_child("left", 3);
    pair.set_child("left", 4);

    // THEN the odd write is refused
    assert_eq!(recorder.error_messages(), vec!["left must be even"]);
    assert_eq!(pair.get("left"), Some(Value::Int(4)));
}

#[test]
fn test_inline_predicate() {
    let ctx = Context::new();
    let user = ctx.composite("user").unwrap();
    let non_empty = TypeSpec::predicate(|value, field| match value.as_str() {
        Some(s) if !s.is_empty() => None,
        _ => Some(format!("{} must be a non-empty string", field)),
    });
    user.add_typed_child("name", "ada", non_empty).unwrap();
    let recorder = Recorder::attach(&user);

    user.set_child("name", "");

    assert_eq!(
        recorder.error_messages(),
        vec!["name must be a non-empty string"]
    );
}

#[test]
fn test_nested_error_record_is_addressable() {
    // GIVEN app.settings.volume
    let ctx = Context::new();
    let app = ctx.composite("app").unwrap();
    let settings = app.add_composite("settings").unwrap();
    settings.add_typed_child("volume", 5, "integer").unwrap();
    let recorder = Recorder::attach(&app);

    // WHEN volume rejects a write
    settings.set_child("volume", "loud");

    // THEN the record at the root nests every hop
    let record = recorder.last_error().unwrap();
    assert_eq!(record.id, "app");
    assert_eq!(record.trail(), vec!["app", "app.settings", "app.settings.volume"]);
    assert_eq!(
        record.origin().error,
        ErrorDetail::validation("volume must be a integer", Value::from("loud"))
    );
    assert_eq!(record.origin().source.as_deref(), Some("volume"));
    assert_eq!(record.origin().target.as_deref(), Some("settings"));
}

#[test]
fn test_config_from_json() {
    let config = Config::from_json(r#"{ "distinct_scalars": false }"#).unwrap();
    let ctx = Context::with_config(config);
    let coord = ctx.composite("coord").unwrap();
    coord.add_typed_child("x", 0, "number").unwrap();
    let recorder = Recorder::attach(&coord);

    coord.set_child("x", 0);

    assert_eq!(recorder.value_count(), 2);
}
