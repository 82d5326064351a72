//! Request-domain checks applied before any computation.
//!
//! The HTTP layer and the CLI both run these so that out-of-range years and
//! clusters are rejected as invalid input instead of surfacing as empty
//! results.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ServerConfig;
use crate::schema::ClusterId;

/// Errors for requests outside the served domain.
#[derive(Debug, Error, Diagnostic)]
pub enum RequestError {
    #[error("year must be between {min} and {max}, got {year}")]
    #[diagnostic(
        code(dinq::request::invalid_year),
        help("Adjust `server.min_year` / `server.max_year` to serve a wider range.")
    )]
    InvalidYear { year: i32, min: i32, max: i32 },

    #[error("cluster must be between 0 and {}, got {cluster}", .count.saturating_sub(1))]
    #[diagnostic(
        code(dinq::request::invalid_cluster),
        help("The classifier assigns {count} clusters; ids start at 0.")
    )]
    InvalidCluster { cluster: ClusterId, count: u32 },
}

pub type RequestResult<T> = std::result::Result<T, RequestError>;

/// Accept `year` only within `[min_year, max_year]`.
pub fn validate_year(year: i32, server: &ServerConfig) -> RequestResult<i32> {
    if (server.min_year..=server.max_year).contains(&year) {
        Ok(year)
    } else {
        Err(RequestError::InvalidYear {
            year,
            min: server.min_year,
            max: server.max_year,
        })
    }
}

/// Accept `cluster` only below `cluster_count`.
pub fn validate_cluster(cluster: ClusterId, server: &ServerConfig) -> RequestResult<ClusterId> {
    if cluster < server.cluster_count {
        Ok(cluster)
    } else {
        Err(RequestError::InvalidCluster {
            cluster,
            count: server.cluster_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_bounds_are_inclusive() {
        let server = ServerConfig::default();
        assert_eq!(validate_year(2014, &server).unwrap(), 2014);
        assert_eq!(validate_year(2028, &server).unwrap(), 2028);
        assert!(matches!(
            validate_year(2013, &server),
            Err(RequestError::InvalidYear { year: 2013, min: 2014, max: 2028 })
        ));
        assert!(validate_year(2029, &server).is_err());
    }

    #[test]
    fn cluster_must_be_below_count() {
        let server = ServerConfig::default();
        assert_eq!(validate_cluster(2, &server).unwrap(), 2);
        let err = validate_cluster(3, &server).unwrap_err();
        assert_eq!(err.to_string(), "cluster must be between 0 and 2, got 3");
    }
}
