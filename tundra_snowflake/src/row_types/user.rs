/// User attributes accumulated from `DESC USER` output.
///
/// Classified through [`USER_PROPERTY_SETTERS`]; unrecognized property names
/// are ignored. Every value stays a string exactly as the server reports it;
/// typed interpretation happens in the reconciler.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct UserProperties {
    pub name: String,
    pub comment: String,
    pub login_name: String,
    pub display_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub must_change_password: String,
    pub disabled: String,
    pub snowflake_lock: String,
    pub snowflake_support: String,
    pub days_to_expiry: String,
    pub mins_to_unlock: String,
    pub default_warehouse: String,
    pub default_namespace: String,
    pub default_role: String,
    pub ext_authn_duo: String,
    pub ext_authn_uid: String,
    pub mins_to_bypass_mfa: String,
    pub mins_to_bypass_network_policy: String,
    /// Fingerprint of the registered public key, not the key itself.
    pub rsa_public_key_fp: String,
    pub rsa_public_key_2_fp: String,
}

type Setter = fn(&mut UserProperties, &str);

/// Property-name to field-setter mapping for `DESC USER` rows.
static USER_PROPERTY_SETTERS: &[(&str, Setter)] = &[
    ("NAME", |u, v| u.name = v.to_owned()),
    ("COMMENT", |u, v| u.comment = v.to_owned()),
    ("LOGIN_NAME", |u, v| u.login_name = v.to_owned()),
    ("DISPLAY_NAME", |u, v| u.display_name = v.to_owned()),
    ("FIRST_NAME", |u, v| u.first_name = v.to_owned()),
    ("MIDDLE_NAME", |u, v| u.middle_name = v.to_owned()),
    ("LAST_NAME", |u, v| u.last_name = v.to_owned()),
    ("EMAIL", |u, v| u.email = v.to_owned()),
    ("PASSWORD", |u, v| u.password = v.to_owned()),
    ("MUST_CHANGE_PASSWORD", |u, v| {
        u.must_change_password = v.to_owned()
    }),
    ("DISABLED", |u, v| u.disabled = v.to_owned()),
    ("SNOWFLAKE_LOCK", |u, v| u.snowflake_lock = v.to_owned()),
    ("SNOWFLAKE_SUPPORT", |u, v| {
        u.snowflake_support = v.to_owned()
    }),
    ("DAYS_TO_EXPIRY", |u, v| u.days_to_expiry = v.to_owned()),
    ("MINS_TO_UNLOCK", |u, v| u.mins_to_unlock = v.to_owned()),
    ("DEFAULT_WAREHOUSE", |u, v| {
        u.default_warehouse = v.to_owned()
    }),
    ("DEFAULT_NAMESPACE", |u, v| {
        u.default_namespace = v.to_owned()
    }),
    ("DEFAULT_ROLE", |u, v| u.default_role = v.to_owned()),
    ("EXT_AUTHN_DUO", |u, v| u.ext_authn_duo = v.to_owned()),
    ("EXT_AUTHN_UID", |u, v| u.ext_authn_uid = v.to_owned()),
    ("MINS_TO_BYPASS_MFA", |u, v| {
        u.mins_to_bypass_mfa = v.to_owned()
    }),
    ("MINS_TO_BYPASS_NETWORK_POLICY", |u, v| {
        u.mins_to_bypass_network_policy = v.to_owned()
    }),
    ("RSA_PUBLIC_KEY_FP", |u, v| {
        u.rsa_public_key_fp = v.to_owned()
    }),
    ("RSA_PUBLIC_KEY_2_FP", |u, v| {
        u.rsa_public_key_2_fp = v.to_owned()
    }),
];

impl UserProperties {
    /// Apply one DESC row. Unrecognized property names are a no-op.
    pub fn apply(&mut self, property: &str, value: &str) {
        if let Some((_, set)) = USER_PROPERTY_SETTERS.iter().find(|(p, _)| *p == property) {
            set(self, value);
        }
    }
}
