/// Stage attributes accumulated from `DESC STAGE` output.
///
/// DESC output is a property list, one row per property, not a fixed-column
/// row. Properties are classified through [`STAGE_PROPERTY_SETTERS`];
/// property names with no entry are dropped on the floor so newer server
/// versions can add properties without breaking reads.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct StageProperties {
    pub url: String,
    pub aws_role: String,
    pub aws_external_id: String,
    pub snowflake_iam_user: String,
}

type Setter = fn(&mut StageProperties, &str);

/// Property-name to field-setter mapping for `DESC STAGE` rows.
static STAGE_PROPERTY_SETTERS: &[(&str, Setter)] = &[
    // The URL property value arrives wrapped like ["s3://bucket/path"].
    ("URL", |s, v| {
        s.url = v.trim_matches(|c| matches!(c, '[' | '"' | ']')).to_owned()
    }),
    ("AWS_ROLE", |s, v| s.aws_role = v.to_owned()),
    ("AWS_EXTERNAL_ID", |s, v| s.aws_external_id = v.to_owned()),
    ("SNOWFLAKE_IAM_USER", |s, v| {
        s.snowflake_iam_user = v.to_owned()
    }),
];

impl StageProperties {
    /// Apply one DESC row. Unrecognized property names are a no-op.
    pub fn apply(&mut self, property: &str, value: &str) {
        if let Some((_, set)) = STAGE_PROPERTY_SETTERS.iter().find(|(p, _)| *p == property) {
            set(self, value);
        }
    }
}
