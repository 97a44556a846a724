//! Account provider manifest parser

use super::element::{parse_document, Element};
use super::record::AccountProviderRecord;
use crate::resolver::{IconResolver, IconSection};
use crate::{IngestError, Result};
use std::path::Path;

const NODE_ACCOUNT_PROVIDER: &str = "account-provider";

const ATTR_APP_ID: &str = "appid";
const ATTR_MULTIPLE_ACCOUNTS_SUPPORT: &str = "multiple-accounts-support";
const ATTR_PROVIDER_ID: &str = "providerid";
const ATTR_SECTION: &str = "section";
const ATTR_XML_LANG: &str = "xml:lang";

/// Children of `<account-provider>` that carry data
enum ProviderChild<'a> {
    Icon(&'a Element),
    Label(&'a Element),
    Capability(&'a Element),
    Ignored,
}

impl<'a> From<&'a Element> for ProviderChild<'a> {
    fn from(e: &'a Element) -> Self {
        match e.name.as_str() {
            "icon" => ProviderChild::Icon(e),
            "label" => ProviderChild::Label(e),
            "capability" => ProviderChild::Capability(e),
            _ => ProviderChild::Ignored,
        }
    }
}

/// Parse a manifest document into a provider record
///
/// The root's first element child is searched for `<account-provider>`;
/// only the first one found is used.
pub fn parse(xml: &str, resolver: &IconResolver<'_>) -> Result<AccountProviderRecord> {
    let root = parse_document(xml)?;
    parse_root(&root, resolver)
}

/// Parse a manifest file into a provider record
pub fn parse_file(path: impl AsRef<Path>, resolver: &IconResolver<'_>) -> Result<AccountProviderRecord> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "Reading manifest");
    let content = std::fs::read_to_string(path)?;
    parse(&content, resolver)
}

/// Walk a parsed document tree into a provider record
pub fn parse_root(root: &Element, resolver: &IconResolver<'_>) -> Result<AccountProviderRecord> {
    let container = root.first_child_element().ok_or_else(|| {
        IngestError::MalformedManifest(format!("<{}> has no child element", root.name))
    })?;
    tracing::debug!(node = %container.name, "Manifest container");

    let provider = container
        .child_elements()
        .find(|e| e.name == NODE_ACCOUNT_PROVIDER)
        .ok_or(IngestError::ProviderNodeMissing)?;

    let inherited_lang = provider
        .attr(ATTR_XML_LANG)
        .or_else(|| container.attr(ATTR_XML_LANG))
        .or_else(|| root.attr(ATTR_XML_LANG));

    parse_provider(provider, inherited_lang, resolver)
}

fn parse_provider(
    provider: &Element,
    inherited_lang: Option<&str>,
    resolver: &IconResolver<'_>,
) -> Result<AccountProviderRecord> {
    let app_id = provider
        .attr(ATTR_APP_ID)
        .filter(|id| !id.is_empty())
        .ok_or(IngestError::MissingAppId)?;
    tracing::debug!(app_id, "Attribute: appid");

    let mut record = AccountProviderRecord::new(app_id);

    if let Some(provider_id) = provider.attr(ATTR_PROVIDER_ID) {
        tracing::debug!(provider_id, "Attribute: providerid");
        record.provider_id = Some(provider_id.to_string());
    }

    let multiple = provider
        .attr(ATTR_MULTIPLE_ACCOUNTS_SUPPORT)
        .ok_or(IngestError::MissingMultiAccountFlag)?;
    record.multiple_accounts_supported = multiple == "true";

    for child in provider.child_elements() {
        match ProviderChild::from(child) {
            ProviderChild::Icon(icon) => {
                let section = icon.attr(ATTR_SECTION).ok_or(IngestError::MissingIconSection)?;
                let Some(kind) = IconSection::from_attr(section) else {
                    tracing::debug!(section, "Ignoring icon section");
                    continue;
                };

                let value = icon
                    .text()
                    .ok_or_else(|| IngestError::MissingIconValue(section.to_string()))?;
                let path = resolver.resolve(&record.app_id, kind, &value)?;

                match kind {
                    IconSection::Account => record.icon_path = Some(path),
                    IconSection::AccountSmall => record.small_icon_path = Some(path),
                }
            }
            ProviderChild::Label(label) => {
                let text = label.text().ok_or(IngestError::MissingLabelValue)?;
                let lang = label.attr(ATTR_XML_LANG).or(inherited_lang);
                tracing::debug!(lang = ?lang, label = %text, "Node: label");
                record.set_label(lang, text);
            }
            ProviderChild::Capability(capability) => {
                let value = capability.text().ok_or(IngestError::MissingCapabilityValue)?;
                tracing::debug!(capability = %value, "Node: capability");
                record.add_capability(value);
            }
            ProviderChild::Ignored => {
                tracing::trace!(node = %child.name, "Ignoring node");
            }
        }
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IconConfig;
    use crate::host::{SharedResourceLookup, StaticAppManager};
    use crate::manifest::DEFAULT_LOCALE;

    const EXAMPLE_MANIFEST: &str = r#"
        <manifest xmlns="http://tizen.org/ns/packages" package="org.example" version="1.0.0">
            <ui-application appid="org.example.mail" exec="/usr/apps/org.example/bin/mail"/>
            <account>
                <account-provider appid="org.example.mail" providerid="http://example.org/mail"
                                  multiple-accounts-support="true">
                    <icon section="account">mail.png</icon>
                    <icon section="account-small">/usr/share/icons/small/mail.png</icon>
                    <icon section="Xhigh">ignored.png</icon>
                    <label>Mail</label>
                    <label xml:lang="en-us">Example Mail</label>
                    <label xml:lang="ko-kr">메일</label>
                    <capability>http://tizen.org/account/capability/email</capability>
                    <capability>http://tizen.org/account/capability/contact</capability>
                    <unknown>whatever</unknown>
                </account-provider>
                <account-provider appid="org.example.second" multiple-accounts-support="false"/>
            </account>
        </manifest>
    "#;

    fn with_resolver<T>(f: impl FnOnce(&IconResolver<'_>) -> T) -> T {
        let policy = IconConfig::default();
        let apps = StaticAppManager::new("/opt/usr/apps/{app_id}/shared/res/");
        let resolver = IconResolver::new(&policy, &apps);
        f(&resolver)
    }

    fn parse_str(xml: &str) -> Result<AccountProviderRecord> {
        with_resolver(|resolver| parse(xml, resolver))
    }

    fn provider(attrs: &str, body: &str) -> String {
        format!(
            "<manifest><account><account-provider {}>{}</account-provider></account></manifest>",
            attrs, body
        )
    }

    #[test]
    fn test_parse_manifest() {
        let err = parse_str(EXAMPLE_MANIFEST).unwrap_err();
        // The first element child of <manifest> is <ui-application>, not <account>
        assert!(matches!(err, IngestError::ProviderNodeMissing));

        let manifest = EXAMPLE_MANIFEST.replace(
            r#"<ui-application appid="org.example.mail" exec="/usr/apps/org.example/bin/mail"/>"#,
            "",
        );
        let record = parse_str(&manifest).unwrap();

        assert_eq!(record.app_id, "org.example.mail");
        assert_eq!(record.provider_id.as_deref(), Some("http://example.org/mail"));
        assert!(record.multiple_accounts_supported);
        assert_eq!(
            record.icon_path.as_deref(),
            Some("/opt/usr/apps/org.example.mail/shared/res/mail.png")
        );
        assert_eq!(record.small_icon_path.as_deref(), Some("/usr/share/icons/small/mail.png"));
        assert_eq!(record.label(DEFAULT_LOCALE), Some("Mail"));
        assert_eq!(record.label("en_US"), Some("Example Mail"));
        assert_eq!(record.label("ko_KR"), Some("메일"));
        assert_eq!(record.capabilities.len(), 2);
    }

    #[test]
    fn test_only_first_provider_is_used() {
        let xml = r#"<manifest><account>
            <account-provider appid="first" multiple-accounts-support="false"/>
            <account-provider appid="second" multiple-accounts-support="true"/>
        </account></manifest>"#;
        let record = parse_str(xml).unwrap();
        assert_eq!(record.app_id, "first");
        assert!(!record.multiple_accounts_supported);
    }

    #[test]
    fn test_multiple_accounts_flag_is_case_sensitive() {
        for (value, expected) in [("true", true), ("false", false), ("TRUE", false), ("1", false)] {
            let xml = provider(
                &format!(r#"appid="org.example" multiple-accounts-support="{}""#, value),
                "",
            );
            assert_eq!(parse_str(&xml).unwrap().multiple_accounts_supported, expected);
        }
    }

    #[test]
    fn test_provider_id_is_optional() {
        let xml = provider(r#"appid="org.example" multiple-accounts-support="false""#, "");
        assert_eq!(parse_str(&xml).unwrap().provider_id, None);
    }

    #[test]
    fn test_missing_required_attributes() {
        let xml = provider(r#"multiple-accounts-support="true""#, "");
        assert!(matches!(parse_str(&xml), Err(IngestError::MissingAppId)));

        let xml = provider(r#"appid="" multiple-accounts-support="true""#, "");
        assert!(matches!(parse_str(&xml), Err(IngestError::MissingAppId)));

        let xml = provider(r#"appid="org.example""#, "");
        assert!(matches!(parse_str(&xml), Err(IngestError::MissingMultiAccountFlag)));
    }

    #[test]
    fn test_structure_errors() {
        assert!(matches!(
            parse_str("<manifest/>"),
            Err(IngestError::MalformedManifest(_))
        ));
        assert!(matches!(
            parse_str("<manifest><account><privileges/></account></manifest>"),
            Err(IngestError::ProviderNodeMissing)
        ));
        assert!(matches!(
            parse_str("<manifest><account>"),
            Err(IngestError::MalformedManifest(_))
        ));
    }

    #[test]
    fn test_child_value_errors() {
        let attrs = r#"appid="org.example" multiple-accounts-support="true""#;

        let xml = provider(attrs, "<icon>mail.png</icon>");
        assert!(matches!(parse_str(&xml), Err(IngestError::MissingIconSection)));

        let xml = provider(attrs, r#"<icon section="account"/>"#);
        assert!(matches!(parse_str(&xml), Err(IngestError::MissingIconValue(_))));

        let xml = provider(attrs, "<label>  </label>");
        assert!(matches!(parse_str(&xml), Err(IngestError::MissingLabelValue)));

        let xml = provider(attrs, "<capability/>");
        assert!(matches!(parse_str(&xml), Err(IngestError::MissingCapabilityValue)));

        // Unknown sections are skipped before their value is read
        let xml = provider(attrs, r#"<icon section="Xhigh"/>"#);
        assert!(parse_str(&xml).is_ok());
    }

    #[test]
    fn test_last_write_wins() {
        let xml = provider(
            r#"appid="org.example" multiple-accounts-support="true""#,
            r#"<icon section="account">/usr/share/icons/a.png</icon>
               <icon section="account">/usr/share/icons/b.png</icon>
               <label xml:lang="en-us">First</label>
               <label xml:lang="en-US">Second</label>"#,
        );
        let record = parse_str(&xml).unwrap();
        assert_eq!(record.icon_path.as_deref(), Some("/usr/share/icons/b.png"));
        assert_eq!(record.label("en_US"), Some("Second"));
        assert_eq!(record.labels.len(), 1);
    }

    #[test]
    fn test_label_inherits_ancestor_lang() {
        let xml = r#"<manifest xml:lang="de-de"><account>
            <account-provider appid="org.example" multiple-accounts-support="true">
                <label>Post</label>
                <label xml:lang="en-gb">Mail</label>
            </account-provider>
        </account></manifest>"#;
        let record = parse_str(xml).unwrap();
        assert_eq!(record.label("de_DE"), Some("Post"));
        assert_eq!(record.label("en_GB"), Some("Mail"));
        assert_eq!(record.label(DEFAULT_LOCALE), None);
    }

    struct UnavailableApps;

    impl SharedResourceLookup for UnavailableApps {
        fn shared_resource_path(&self, app_id: &str) -> Result<String> {
            Err(IngestError::SharedResourcePathUnavailable {
                app_id: app_id.to_string(),
                reason: "not installed".to_string(),
            })
        }
    }

    #[test]
    fn test_resolve_failure_aborts_parse() {
        let policy = IconConfig::default();
        let apps = UnavailableApps;
        let resolver = IconResolver::new(&policy, &apps);

        let xml = provider(
            r#"appid="org.example" multiple-accounts-support="true""#,
            r#"<icon section="account">mail.png</icon>"#,
        );
        assert!(matches!(
            parse(&xml, &resolver),
            Err(IngestError::SharedResourcePathUnavailable { .. })
        ));
    }
}
