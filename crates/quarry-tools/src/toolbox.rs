//! Declarative tool definitions for the external MCP toolbox service.
//!
//! The toolbox hosts parameterized Cypher templates against a named Neo4j
//! source. This module renders that configuration from the active Neo4j
//! settings and writes it where the agent runtime picks it up.

use std::path::Path;

use serde::{Serialize, Serializer};

use quarry_core::Neo4jSettings;

use crate::error::Result;

/// Name the tools use to reference the graph source.
pub const SOURCE_NAME: &str = "companies-graph";

#[derive(Debug, Clone, Serialize)]
pub struct ToolboxDocument {
    #[serde(serialize_with = "source_map")]
    pub sources: ToolboxSource,
    #[serde(serialize_with = "tool_map")]
    pub tools: Vec<ToolboxTool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolboxSource {
    pub kind: String,
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

/// A parameterized, read-only Cypher template.
#[derive(Debug, Clone, Serialize)]
pub struct ToolboxTool {
    #[serde(skip)]
    pub name: String,
    pub kind: String,
    pub source: String,
    pub statement: String,
    pub description: String,
    pub parameters: Vec<ToolboxParameter>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolboxParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    pub description: String,
}

impl ToolboxTool {
    fn cypher(name: &str, statement: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: "neo4j-cypher".to_string(),
            source: SOURCE_NAME.to_string(),
            statement: statement.to_string(),
            description: description.to_string(),
            parameters: Vec::new(),
        }
    }

    fn param(mut self, name: &str, param_type: &str, description: &str) -> Self {
        self.parameters.push(ToolboxParameter {
            name: name.to_string(),
            param_type: param_type.to_string(),
            description: description.to_string(),
        });
        self
    }
}

fn source_map<S: Serializer>(source: &ToolboxSource, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_map([(SOURCE_NAME, source)])
}

fn tool_map<S: Serializer>(tools: &[ToolboxTool], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_map(tools.iter().map(|tool| (tool.name.as_str(), tool)))
}

/// The fixed set of company research templates.
pub fn toolbox_tools() -> Vec<ToolboxTool> {
    vec![
        ToolboxTool::cypher(
            "companies_in_industry",
            "MATCH (:IndustryCategory {name:$industry})<-[:HAS_CATEGORY]-(c)\n\
             WHERE NOT EXISTS { (c)<-[:HAS_SUBSIDARY]-() }\n\
             RETURN c.id as company_id, c.name as name, c.summary as summary\n",
            "Companies (company_id, name, summary) in a given industry by industry",
        )
        .param("industry", "string", "Industry name to filter companies by"),
        ToolboxTool::cypher(
            "companies",
            "CALL db.index.fulltext.queryNodes(\"companies_fulltext\", $search)\n\
             YIELD node AS c, score\n\
             RETURN c.id as company_id, c.name as name, c.summary as summary\n\
             LIMIT 10\n",
            "List of Companies (id, name, summary) matching search text",
        )
        .param("search", "string", "Full-text search query for company names"),
        ToolboxTool::cypher(
            "industries",
            "MATCH (i:IndustryCategory)\n\
             RETURN DISTINCT i.name as industry_name\n\
             ORDER BY i.name\n",
            "List of Industry names",
        ),
        ToolboxTool::cypher(
            "articles_in_month",
            "MATCH (a:Article)\n\
             WHERE date($date) <= date(a.date) < date($date) + duration('P1M')\n\
             RETURN a.id as article_id, a.author as author, a.title as title, toString(a.date) as date, a.sentiment as sentiment\n\
             LIMIT 25\n",
            "List of Articles (id, author, title, date, sentiment) in a month timeframe from the given date",
        )
        .param("date", "string", "Start date in yyyy-mm-dd format"),
        ToolboxTool::cypher(
            "article",
            "MATCH (a:Article {id: $article_id})\n\
             RETURN a.id as article_id, a.author as author, a.title as title,\n       \
             toString(a.date) as date, a.sentiment as sentiment,\n       \
             a.site as site, a.summary as summary, a.content as content\n",
            "Single Article details by article ID",
        )
        .param("article_id", "string", "Article ID to fetch"),
        ToolboxTool::cypher(
            "companies_in_articles",
            "MATCH (o:Organization)<-[:MENTIONS]-(a:Article)\n\
             WHERE a.id IN $article_ids\n\
             RETURN DISTINCT o.id as company_id, o.name as name, o.summary as summary\n",
            "Companies mentioned in articles by article IDs",
        )
        .param("article_ids", "array", "List of article IDs"),
        ToolboxTool::cypher(
            "people_at_company",
            "MATCH (p:Person)-[r]-(o:Organization {id: $company_id})\n\
             WHERE type(r) IN [\"HAS_CEO\", \"HAS_BOARD_MEMBER\"]\n\
             RETURN p.name as name, type(r) as role\n",
            "People (name, role) associated with a company by company ID",
        )
        .param("company_id", "string", "Company ID to find people for"),
    ]
}

pub fn toolbox_document(settings: &Neo4jSettings) -> ToolboxDocument {
    ToolboxDocument {
        sources: ToolboxSource {
            kind: "neo4j".to_string(),
            uri: settings.uri.clone(),
            user: settings.username.clone(),
            password: settings.password.clone(),
            database: settings.database.clone(),
        },
        tools: toolbox_tools(),
    }
}

pub fn render_toolbox_yaml(settings: &Neo4jSettings) -> Result<String> {
    Ok(serde_yaml::to_string(&toolbox_document(settings))?)
}

/// Render and write the toolbox file, creating parent directories.
pub fn write_toolbox_yaml(settings: &Neo4jSettings, path: &Path) -> Result<()> {
    let yaml = render_toolbox_yaml(settings)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, yaml)?;
    tracing::info!(path = %path.display(), tools = toolbox_tools().len(), "Toolbox configuration written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_graph::WriteGuard;

    fn settings() -> Neo4jSettings {
        Neo4jSettings {
            uri: "neo4j://localhost:7687".to_string(),
            username: "reader".to_string(),
            password: "secret".to_string(),
            database: "companies".to_string(),
            ..Neo4jSettings::default()
        }
    }

    #[test]
    fn test_templates_are_read_only() {
        let guard = WriteGuard::default();
        for tool in toolbox_tools() {
            assert!(!guard.is_write(&tool.statement), "{} looks like a write", tool.name);
        }
    }

    #[test]
    fn test_yaml_has_source_and_ordered_tools() {
        let yaml = render_toolbox_yaml(&settings()).unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

        let source = &doc["sources"][SOURCE_NAME];
        assert_eq!(source["kind"].as_str(), Some("neo4j"));
        assert_eq!(source["uri"].as_str(), Some("neo4j://localhost:7687"));
        assert_eq!(source["user"].as_str(), Some("reader"));
        assert_eq!(source["database"].as_str(), Some("companies"));

        let tools = doc["tools"].as_mapping().unwrap();
        let names: Vec<&str> = tools.keys().filter_map(|k| k.as_str()).collect();
        assert_eq!(names[0], "companies_in_industry");
        assert_eq!(names.len(), 7);

        let articles = &doc["tools"]["companies_in_articles"];
        assert_eq!(articles["source"].as_str(), Some(SOURCE_NAME));
        assert_eq!(articles["parameters"][0]["type"].as_str(), Some("array"));
        assert!(doc["tools"]["industries"]["parameters"]
            .as_sequence()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("investment_agent/.adk/tools.yaml");

        write_toolbox_yaml(&settings(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("people_at_company"));
    }
}
