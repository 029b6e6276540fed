//! Discovery payload elements.
//!
//! A `Discover.Response` lists one [`EndpointDescriptor`] per controllable
//! device, each declaring the [`CapabilityDescriptor`]s it supports.  Every
//! endpoint must include the base `Alexa` interface.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::PAYLOAD_VERSION;

/// Interface type shared by every capability descriptor.
pub const ALEXA_INTERFACE: &str = "AlexaInterface";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedProperty {
    pub name: String,
}

impl SupportedProperty {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityProperties {
    pub supported: Vec<SupportedProperty>,
    pub proactively_reported: bool,
    pub retrievable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    pub interface: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability_resources: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<CapabilityProperties>,
}

/// Options for [`CapabilityDescriptor::new`].  The default describes the base
/// `Alexa` interface.
#[derive(Debug, Clone)]
pub struct CapabilityOptions {
    pub interface: String,
    pub supported: Vec<SupportedProperty>,
    pub instance: Option<String>,
    pub capability_resources: Option<Map<String, Value>>,
    pub proactively_reported: bool,
    pub retrievable: bool,
}

impl Default for CapabilityOptions {
    fn default() -> Self {
        Self {
            interface: "Alexa".to_string(),
            supported: Vec::new(),
            instance: None,
            capability_resources: None,
            proactively_reported: false,
            retrievable: false,
        }
    }
}

impl CapabilityDescriptor {
    /// Build a descriptor; `properties` is emitted only when at least one
    /// supported property is listed.
    pub fn new(options: CapabilityOptions) -> Self {
        let properties = (!options.supported.is_empty()).then(|| CapabilityProperties {
            supported: options.supported,
            proactively_reported: options.proactively_reported,
            retrievable: options.retrievable,
        });

        Self {
            kind: ALEXA_INTERFACE.to_string(),
            interface: options.interface,
            version: PAYLOAD_VERSION.to_string(),
            instance: options.instance,
            capability_resources: options.capability_resources,
            properties,
        }
    }

    /// The base `Alexa` interface every endpoint must declare.
    pub fn alexa() -> Self {
        Self::new(CapabilityOptions::default())
    }
}

/// `capabilityResources` declaring a single text friendly name.
pub fn friendly_name_resources(text: &str, locale: &str) -> Map<String, Value> {
    let mut resources = Map::new();
    resources.insert(
        "friendlyNames".to_string(),
        json!([{ "@type": "text", "value": { "text": text, "locale": locale } }]),
    );
    resources
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalAttributes {
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    pub firmware_version: String,
    pub software_version: String,
    pub custom_identifier: String,
}

impl Default for AdditionalAttributes {
    fn default() -> Self {
        Self {
            manufacturer: "Whole Electronic Solutions".to_string(),
            model: "Sample Model".to_string(),
            serial_number: "U11112233456".to_string(),
            firmware_version: "1.24.2546".to_string(),
            software_version: "1.036".to_string(),
            custom_identifier: "Sample custom ID".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDescriptor {
    pub endpoint_id: String,
    pub friendly_name: String,
    pub description: String,
    pub manufacturer_name: String,
    pub display_categories: Vec<String>,
    pub additional_attributes: AdditionalAttributes,
    pub capabilities: Vec<CapabilityDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<Map<String, Value>>,
}

/// Options for [`EndpointDescriptor::new`].
#[derive(Debug, Clone)]
pub struct EndpointOptions {
    pub friendly_name: String,
    pub description: String,
    pub manufacturer_name: String,
    pub display_categories: Vec<String>,
    pub additional_attributes: AdditionalAttributes,
    pub cookie: Option<Map<String, Value>>,
}

impl Default for EndpointOptions {
    fn default() -> Self {
        Self {
            friendly_name: "Spa".to_string(),
            description: "spa controller application".to_string(),
            manufacturer_name: "Whole Electronic Solutions".to_string(),
            display_categories: vec!["OTHER".to_string()],
            additional_attributes: AdditionalAttributes::default(),
            cookie: None,
        }
    }
}

impl EndpointDescriptor {
    pub fn new(
        endpoint_id: impl Into<String>,
        capabilities: Vec<CapabilityDescriptor>,
        options: EndpointOptions,
    ) -> Self {
        Self {
            endpoint_id: endpoint_id.into(),
            friendly_name: options.friendly_name,
            description: options.description,
            manufacturer_name: options.manufacturer_name,
            display_categories: options.display_categories,
            additional_attributes: options.additional_attributes,
            capabilities,
            cookie: options.cookie,
        }
    }

    /// Interfaces declared by this endpoint, in declaration order.
    pub fn interfaces(&self) -> impl Iterator<Item = &str> {
        self.capabilities.iter().map(|c| c.interface.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_alexa_descriptor_has_no_properties() {
        let wire = serde_json::to_value(CapabilityDescriptor::alexa()).unwrap();
        assert_eq!(wire["type"], "AlexaInterface");
        assert_eq!(wire["interface"], "Alexa");
        assert_eq!(wire["version"], "3");
        assert!(wire.get("properties").is_none());
        assert!(wire.get("instance").is_none());
        assert!(wire.get("capabilityResources").is_none());
    }

    #[test]
    fn properties_present_iff_supported_non_empty() {
        let empty = CapabilityDescriptor::new(CapabilityOptions {
            interface: "Alexa.ToggleController".to_string(),
            retrievable: true,
            ..CapabilityOptions::default()
        });
        assert!(empty.properties.is_none());

        let toggle = CapabilityDescriptor::new(CapabilityOptions {
            interface: "Alexa.ToggleController".to_string(),
            supported: vec![SupportedProperty::new("toggleState")],
            instance: Some("Spa.Lights".to_string()),
            capability_resources: Some(friendly_name_resources("Lights", "en-US")),
            retrievable: true,
            ..CapabilityOptions::default()
        });
        let wire = serde_json::to_value(&toggle).unwrap();
        assert_eq!(wire["instance"], "Spa.Lights");
        assert_eq!(wire["properties"]["supported"][0]["name"], "toggleState");
        assert_eq!(wire["properties"]["retrievable"], true);
        assert_eq!(wire["properties"]["proactivelyReported"], false);
        assert_eq!(
            wire["capabilityResources"]["friendlyNames"][0]["value"]["text"],
            "Lights"
        );
    }

    #[test]
    fn endpoint_descriptor_uses_wire_names() {
        let endpoint = EndpointDescriptor::new(
            "spa_test_1",
            vec![CapabilityDescriptor::alexa()],
            EndpointOptions::default(),
        );
        let wire = serde_json::to_value(&endpoint).unwrap();
        assert_eq!(wire["endpointId"], "spa_test_1");
        assert_eq!(wire["friendlyName"], "Spa");
        assert_eq!(wire["manufacturerName"], "Whole Electronic Solutions");
        assert_eq!(wire["displayCategories"][0], "OTHER");
        assert_eq!(wire["additionalAttributes"]["serialNumber"], "U11112233456");
        assert!(wire.get("cookie").is_none());
        assert_eq!(endpoint.interfaces().collect::<Vec<_>>(), vec!["Alexa"]);
    }

    #[test]
    fn endpoint_cookie_is_emitted_when_set() {
        let mut cookie = Map::new();
        cookie.insert("spa".to_string(), Value::from("garden"));
        let endpoint = EndpointDescriptor::new(
            "spa_test_2",
            Vec::new(),
            EndpointOptions {
                cookie: Some(cookie),
                ..EndpointOptions::default()
            },
        );
        let wire = serde_json::to_value(&endpoint).unwrap();
        assert_eq!(wire["cookie"]["spa"], "garden");
    }
}
