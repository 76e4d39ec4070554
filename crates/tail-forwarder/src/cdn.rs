// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Conversion of a fetch sub-event into a flat CDN log record.
//!
//! The record mirrors the shape expected by downstream CDN-log tooling:
//! `request`/`response` sections with folded header maps, a `client` section
//! sourced from the edge metadata, and a `cdn` section carrying geo data and
//! cache information. Fields that are not observable from tail data are fixed
//! constants; fields that cannot be resolved confidently stay absent and are
//! omitted from the serialized record.

use std::collections::HashMap;

use serde::Serialize;
use url::Url;

use crate::event::TailEvent;
use crate::fields::FieldResolver;

/// Identifies the producing edge platform
const BACKEND: &str = "cloudflare-worker";
const REQUEST_TYPE: &str = "none";
const BACKEND_TYPE: &str = "worker";
const CONTENTBUS_PREFIX: &str = "";
/// Schema revision of the emitted CDN record
const CDN_LOG_VERSION: &str = "1";

/// Errors that prevent a CDN record from being produced. Both are recovered
/// by the caller with a placeholder text log.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("tail event carries no request data")]
    NoRequestData,

    #[error("request URL could not be parsed: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

#[derive(Debug, Serialize)]
pub struct CdnRecord {
    pub request: RequestSection,
    pub response: ResponseSection,
    pub helix: HelixSection,
    pub client: ClientSection,
    pub cdn: CdnSection,
}

#[derive(Debug, Serialize)]
pub struct RequestSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Path component only, query stripped
    pub url: String,
    /// Raw query string without the leading `?`
    pub qs: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    pub backend: &'static str,
    pub restarts: u32,
    pub body_size: u64,
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct ResponseSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub body_size: u64,
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct HelixSection {
    pub request_type: &'static str,
    pub backend_type: &'static str,
    pub contentbus_prefix: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ClientSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CdnSection {
    pub originating_ip_geoip: GeoIpSection,
    pub version: &'static str,
    /// The original full URL, unparsed
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub originating_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_elapsed_msec: Option<f64>,
    pub is_edge: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_status: Option<String>,
    pub cache_ttl: u32,
}

#[derive(Debug, Serialize)]
pub struct GeoIpSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    pub location_geopoint: GeoPoint,
    pub asn: AsnSection,
}

#[derive(Debug, Serialize)]
pub struct GeoPoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct AsnSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

/// Normalize a header map: keys lower-cased with hyphens replaced by
/// underscores, values untouched. Last write wins on key collisions.
pub fn fold_headers(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(key, value)| (key.to_lowercase().replace('-', "_"), value.clone()))
        .collect()
}

/// Build a CDN record from the fetch sub-event of `event`.
pub fn convert(event: &TailEvent, resolver: &FieldResolver) -> Result<CdnRecord, ConvertError> {
    let fetch = event.event.as_ref().ok_or(ConvertError::NoRequestData)?;
    let request = fetch.request.as_ref().ok_or(ConvertError::NoRequestData)?;

    let raw_url = request.url.clone().unwrap_or_default();
    let parsed = Url::parse(&raw_url)?;

    let cf = request.cf.as_ref();
    let response = fetch.response.as_ref();

    // Fold before any header lookups; the post-fold key names are the
    // canonical ones.
    let request_headers = fold_headers(&request.headers);
    let response_headers = response
        .map(|response| fold_headers(&response.headers))
        .unwrap_or_default();

    let host = request_headers
        .get("host")
        .cloned()
        .or_else(|| parsed.host_str().map(str::to_string));

    let status = response.and_then(|response| response.status).map(|status| status.to_string());
    let status = resolver.resolve(status.as_deref(), "status", "fetch response");

    let ip = resolver
        .resolve(cf.and_then(|cf| cf.ip.as_deref()), "ip", "request cf data")
        .or_else(|| {
            resolver.resolve(
                request_headers.get("cf_connecting_ip").map(String::as_str),
                "cf_connecting_ip",
                "request headers",
            )
        });

    let asn = cf.and_then(|cf| cf.asn);
    let organization = resolver.resolve(
        cf.and_then(|cf| cf.as_organization.as_deref()),
        "asOrganization",
        "request cf data",
    );

    fn cf_field(resolver: &FieldResolver, field: &str, value: Option<&str>) -> Option<String> {
        resolver.resolve(value, field, "request cf data")
    }

    Ok(CdnRecord {
        request: RequestSection {
            method: request.method.clone(),
            host,
            url: parsed.path().to_string(),
            qs: parsed.query().unwrap_or_default().to_string(),
            protocol: cf_field(resolver, "httpProtocol", cf.and_then(|cf| cf.http_protocol.as_deref())),
            backend: BACKEND,
            restarts: 0,
            body_size: 0,
            headers: request_headers,
        },
        response: ResponseSection {
            status,
            body_size: 0,
            headers: response_headers.clone(),
        },
        helix: HelixSection {
            request_type: REQUEST_TYPE,
            backend_type: BACKEND_TYPE,
            contentbus_prefix: CONTENTBUS_PREFIX,
        },
        client: ClientSection {
            name: organization.clone(),
            number: asn,
            city_name: cf_field(resolver, "city", cf.and_then(|cf| cf.city.as_deref())),
            country_name: cf_field(resolver, "country", cf.and_then(|cf| cf.country.as_deref())),
            ip: ip.clone(),
        },
        cdn: CdnSection {
            originating_ip_geoip: GeoIpSection {
                city_name: cf_field(resolver, "city", cf.and_then(|cf| cf.city.as_deref())),
                country_name: cf_field(resolver, "country", cf.and_then(|cf| cf.country.as_deref())),
                continent: cf_field(resolver, "continent", cf.and_then(|cf| cf.continent.as_deref())),
                postal_code: cf_field(resolver, "postalCode", cf.and_then(|cf| cf.postal_code.as_deref())),
                location_geopoint: GeoPoint {
                    lat: resolver.resolve_f64(
                        cf.and_then(|cf| cf.latitude.as_deref()),
                        "latitude",
                        "request cf data",
                    ),
                    lon: resolver.resolve_f64(
                        cf.and_then(|cf| cf.longitude.as_deref()),
                        "longitude",
                        "request cf data",
                    ),
                },
                asn: AsnSection {
                    number: asn.map(|asn| asn.to_string()),
                    organization,
                },
            },
            version: CDN_LOG_VERSION,
            url: raw_url,
            originating_ip: ip,
            time_elapsed_msec: fetch.wall_time,
            is_edge: true,
            datacenter: cf_field(resolver, "colo", cf.and_then(|cf| cf.colo.as_deref())),
            region_code: cf_field(resolver, "regionCode", cf.and_then(|cf| cf.region_code.as_deref())),
            cache_status: response_headers.get("cf_cache_status").cloned(),
            cache_ttl: 0,
        },
    })
}
