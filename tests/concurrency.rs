use shape_schema::ir::{Record, Registry, Ty};
use shape_schema::Schema;

fn wide_schema() -> Schema {
    let mut reg = Registry::new();
    reg.define(
        "Leaf",
        Record::new().field("k", Ty::primitive("str")).field("v", Ty::optional(Ty::primitive("int"))),
    );
    let mut root = Record::new();
    for i in 0..200 {
        let ty = match i % 3 {
            0 => Ty::primitive("int"),
            1 => Ty::list(Ty::named("Leaf")),
            _ => Ty::union([Ty::named("Leaf"), Ty::Null]),
        };
        root.push(format!("f{i}"), ty);
    }
    Schema::new(reg, root.into())
}

#[test]
fn concurrent_renders_agree() {
    let schema = wide_schema();
    let expected = schema.render().unwrap();
    std::thread::scope(|s| {
        let handles = (0..8).map(|_| s.spawn(|| schema.render().unwrap())).collect::<Vec<_>>();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
    assert_eq!(expected.lines().count(), 2 + 200 + (200 / 3 + 1) * 3 + (200 / 3) * 3);
}
