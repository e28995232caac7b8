use expect_test::expect;
use shape_schema::ir::{Record, Registry, Ty};
use shape_schema::{describe_record, schema_of};

#[test]
fn schema_snapshot_tool_arguments() {
    let mut reg = Registry::new();
    reg.define(
        "Attendee",
        Record::new()
            .field("email", Ty::primitive("str"))
            .field("optional", Ty::optional(Ty::primitive("bool"))),
    );
    reg.define(
        "CreateEvent",
        Record::new()
            .field("title", Ty::primitive("str"))
            .field("attendees", Ty::list(Ty::named("Attendee")))
            .field(
                "when",
                Record::new()
                    .field("start", Ty::primitive("datetime"))
                    .field("end", Ty::optional(Ty::primitive("datetime")))
                    .into(),
            )
            .field("labels", Ty::list(Ty::primitive("str")))
            .field("priority", Ty::union([Ty::primitive("int"), Ty::other("Literal['high', 'low']")])),
    );

    expect![[r#"
        {
            'title': 'str',
            'attendees': [{
                'email': 'str',
                'optional': Union['bool']
            }],
            'when': {
                'start': 'datetime',
                'end': Union['datetime']
            },
            'labels': [str],
            'priority': Union['int', 'Literal['high', 'low']']
        }"#]]
    .assert_eq(&reg.render("CreateEvent").unwrap());
}

describe_record! {
    #[allow(dead_code)]
    struct Comment {
        author: String,
        body: String,
        replies: Vec<Comment>,
    }
}

describe_record! {
    #[allow(dead_code)]
    struct Thread {
        id: u64,
        comments: Vec<Comment>,
        pinned: Option<Comment>,
    }
}

#[test]
fn schema_snapshot_recursive_struct() {
    expect![[r#"
        {
            'id': 'u64',
            'comments': [{
                'author': 'String',
                'body': 'String',
                'replies': ['<recursive Comment>']
            }],
            'pinned': Union[{
                'author': 'String',
                'body': 'String',
                'replies': ['<recursive Comment>']
            }]
        }"#]]
    .assert_eq(&schema_of::<Thread>().render().unwrap());
}
