pub use domain_key::KeyParseError;
use domain_key::{define_domain, key_type};

define_domain!(PrameterDomain, "parameter");
key_type!(ParameterKey, PrameterDomain);

define_domain!(CredentialDomain, "credential");
key_type!(CredentialKey, CredentialDomain);

define_domain!(NodeDomain, "node");
key_type!(NodeKey, NodeDomain);

/// Error returned when a string cannot be normalized into a [`NodeKey`].
pub type NodeKeyError = KeyParseError;
