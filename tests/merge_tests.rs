use nodesync::generator::{merge_groups, merge_proxies, GroupSelection, MergePolicy};
use nodesync::models::ConfigDocument;
use nodesync::parser::{parse_node_list, NameStrictness};

#[cfg(test)]
mod merge_tests {
    use super::*;

    const BASE_CONFIG: &str = r#"
mixed-port: 7890
mode: rule
proxies:
  - name: retired
    type: ss
    server: 9.9.9.9
    port: 8388
    cipher: aes-128-gcm
    password: x
proxy-groups:
  - name: Proxy
    type: select
    proxies: [Auto, retired]
  - name: Auto
    type: url-test
    url: http://www.gstatic.com/generate_204
    interval: 300
    proxies: [retired, Auto, REJECT]
  - name: Streaming
    type: fallback
    proxies: [DIRECT, retired]
  - name: Chain
    type: relay
    proxies: [retired, Chain]
rules:
  - MATCH,Proxy
"#;

    const NODES: &str = "ss://YWVzLTI1Ni1nY206cGFzcw==@1.2.3.4:8388#HK-01
trojan://pw@t.example.com:443#Auto
http://h.example.com:8080#Office
";

    fn merged() -> ConfigDocument {
        let batch = parse_node_list(NODES, NameStrictness::Strict);
        let mut doc = ConfigDocument::parse(BASE_CONFIG).unwrap();
        let proxies = merge_proxies(&mut doc, &batch.records, MergePolicy::ReplaceAll);
        merge_groups(&mut doc, &proxies.names, &GroupSelection::AllGroups);
        doc
    }

    fn members(doc: &ConfigDocument, group: &str) -> Vec<String> {
        doc.proxy_groups()
            .into_iter()
            .find(|g| g.name == group)
            .map(|g| g.proxies)
            .unwrap()
    }

    #[test]
    fn test_proxies_replaced_wholesale() {
        let doc = merged();
        assert_eq!(doc.proxy_names(), vec!["HK-01", "Auto", "Office"]);
    }

    #[test]
    fn test_groups_follow_retention_rule() {
        let doc = merged();

        // reserved
        assert_eq!(members(&doc, "Proxy"), vec!["Auto", "retired"]);
        // own name excluded, only REJECT kept
        assert_eq!(members(&doc, "Auto"), vec!["REJECT", "HK-01", "Office"]);
        assert_eq!(members(&doc, "Streaming"), vec!["DIRECT", "HK-01", "Auto", "Office"]);
        // relay is not selectable, but the post-pass still drops the self-reference
        assert_eq!(members(&doc, "Chain"), vec!["retired"]);
    }

    #[test]
    fn test_no_group_lists_itself() {
        let doc = merged();
        for group in doc.proxy_groups() {
            assert!(!group.proxies.contains(&group.name), "{} lists itself", group.name);
        }
    }

    #[test]
    fn test_unrelated_keys_untouched() {
        let doc = merged();
        let text = doc.to_yaml_string().unwrap();
        let reparsed = ConfigDocument::parse(&text).unwrap();

        assert_eq!(reparsed.root()["mixed-port"], 7890);
        assert_eq!(reparsed.root()["mode"], "rule");
        assert_eq!(reparsed.root()["rules"][0], "MATCH,Proxy");
        assert_eq!(
            reparsed.root()["proxy-groups"][1]["url"],
            "http://www.gstatic.com/generate_204"
        );
        assert!(text.find("mixed-port").unwrap() < text.find("proxies").unwrap());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let batch = parse_node_list(NODES, NameStrictness::Strict);
        let mut doc = merged();
        let once = doc.to_yaml_string().unwrap();

        let proxies = merge_proxies(&mut doc, &batch.records, MergePolicy::ReplaceAll);
        let groups = merge_groups(&mut doc, &proxies.names, &GroupSelection::AllGroups);

        assert_eq!(doc.to_yaml_string().unwrap(), once);
        assert_eq!(groups.newly_added, 0);
        assert_eq!(groups.self_references_removed, 0);
    }

    #[test]
    fn test_removed_node_disappears_everywhere() {
        let mut doc = merged();
        let batch = parse_node_list("http://h.example.com:8080#Office\n", NameStrictness::Strict);

        let proxies = merge_proxies(&mut doc, &batch.records, MergePolicy::ReplaceAll);
        merge_groups(&mut doc, &proxies.names, &GroupSelection::AllGroups);

        assert_eq!(doc.proxy_names(), vec!["Office"]);
        assert_eq!(members(&doc, "Streaming"), vec!["DIRECT", "Office"]);
    }

    #[test]
    fn test_legacy_field_names_are_kept() {
        let mut doc = ConfigDocument::parse(
            "Proxy:\n  - {name: old, type: http, server: h, port: 80}\nProxy Group:\n  - {name: G, type: select, proxies: [old]}\n",
        )
        .unwrap();
        let batch = parse_node_list("http://h.example.com:8080#New\n", NameStrictness::Strict);

        let proxies = merge_proxies(&mut doc, &batch.records, MergePolicy::ReplaceAll);
        merge_groups(&mut doc, &proxies.names, &GroupSelection::AllGroups);

        let text = doc.to_yaml_string().unwrap();
        assert!(!text.contains("proxy-groups"));
        assert_eq!(doc.proxy_names(), vec!["New"]);
        assert_eq!(members(&doc, "G"), vec!["New"]);
    }

    #[test]
    fn test_names_with_combining_marks_survive_merge() {
        let mut doc = ConfigDocument::parse(BASE_CONFIG).unwrap();
        let batch = parse_node_list(
            "http://a.example.com:80#ภูเก็ต\nhttp://b.example.com:80#हिन्दी\n",
            NameStrictness::Strict,
        );
        let names: Vec<&str> = batch.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["ภูเก็ต", "हिन्दी"]);

        let proxies = merge_proxies(&mut doc, &batch.records, MergePolicy::ReplaceAll);
        let groups = merge_groups(&mut doc, &proxies.names, &GroupSelection::AllGroups);

        assert_eq!(proxies.injected, 2);
        assert_eq!(proxies.skipped_invalid, 0);
        assert_eq!(groups.invalid_names, 0);
        assert_eq!(doc.proxy_names(), vec!["ภูเก็ต", "हिन्दी"]);
        assert_eq!(members(&doc, "Streaming"), vec!["DIRECT", "ภูเก็ต", "हिन्दी"]);
    }
}
