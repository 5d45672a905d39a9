//! Resource catalog tests

use cf_support::catalog::{resources_for, resources_for_name, Policy, RuntimeType, Scope, TableKind};
use cf_support::error::SupportError;
use std::collections::HashSet;

#[test]
fn test_every_runtime_has_distinct_kinds() {
    for runtime in RuntimeType::ALL {
        let kinds = resources_for(runtime);
        assert!(!kinds.is_empty(), "{runtime} has no kinds");

        let names: HashSet<_> = kinds.iter().map(|k| k.name).collect();
        assert_eq!(names.len(), kinds.len(), "{runtime} has duplicate kind names");
    }
}

#[test]
fn test_catalog_is_deterministic() {
    for runtime in RuntimeType::ALL {
        assert_eq!(resources_for(runtime), resources_for(runtime));
    }
}

#[test]
fn test_gitops_has_argo_kinds_but_no_volumes() {
    let names: Vec<_> = resources_for(RuntimeType::GitOps).iter().map(|k| k.name).collect();
    assert!(names.contains(&"Applications"));
    assert!(names.contains(&"ApplicationSets"));
    assert!(names.contains(&"Statefulsets"));
    assert!(!names.contains(&"Volumes"));
    assert!(!names.contains(&"Storageclass"));
}

#[test]
fn test_onprem_differs_from_pipelines_only_in_configmap_labels() {
    let pipelines = resources_for(RuntimeType::Pipelines);
    let onprem = resources_for(RuntimeType::OnPrem);
    assert_eq!(pipelines.len(), onprem.len());

    for (p, o) in pipelines.iter().zip(&onprem) {
        assert_eq!(p.name, o.name);
        assert_eq!(p.policy, o.policy);
        if p.name == "Configmaps" {
            assert_eq!(p.label_selector, Some("app.kubernetes.io/name=cf-runtime"));
            assert_eq!(o.label_selector, None);
        } else {
            assert_eq!(p.label_selector, o.label_selector);
        }
    }
}

#[test]
fn test_policies_and_scopes() {
    let kinds = resources_for(RuntimeType::Pipelines);
    let find = |name: &str| kinds.iter().find(|k| k.name == name).unwrap();

    assert_eq!(find("Pods").policy, Policy::LogsAndDescribe);
    assert_eq!(find("Events").policy, Policy::EventLog);
    assert_eq!(find("HelmReleases").policy, Policy::SecretDecode);
    assert_eq!(find("HelmReleases").label_selector, Some("owner=helm"));
    assert_eq!(find("Volumes").policy, Policy::Tabular(TableKind::Volumes));
    assert_eq!(find("Volumes").scope, Scope::Cluster);
    assert_eq!(find("Nodes").scope, Scope::Cluster);
    assert_eq!(find("Volumeclaims").scope, Scope::Namespaced);
}

#[test]
fn test_runtime_type_parsing() {
    assert_eq!("gitops".parse::<RuntimeType>().unwrap(), RuntimeType::GitOps);
    assert_eq!("Pipelines Runtime".parse::<RuntimeType>().unwrap(), RuntimeType::Pipelines);
    assert_eq!("ONPREM".parse::<RuntimeType>().unwrap(), RuntimeType::OnPrem);
    assert!(matches!(
        "classic".parse::<RuntimeType>(),
        Err(SupportError::InvalidRuntimeType(_))
    ));
}

#[test]
fn test_resources_for_name() {
    assert_eq!(resources_for_name("onprem").unwrap(), resources_for(RuntimeType::OnPrem));
    assert!(matches!(resources_for_name(""), Err(SupportError::InvalidRuntimeType(_))));
}
