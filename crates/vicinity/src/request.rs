//! Search requests, and normalisation of raw request parameters into them.

use tracing::debug;

use crate::{
    entity::GeoPoint,
    error::{Result, VicinityError},
    search::DEFAULT_RADIUS_KM,
};

/// One incoming query.
///
/// A radius search runs when `center` is set; a locality search runs when
/// `state` is set. Both may run, in which case their results are merged.
///
/// # Examples
///
/// ```rust
/// use vicinity::SearchRequest;
///
/// let request = SearchRequest::near(40.0, -73.0)
///     .radius_km(10)
///     .in_state("NY");
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub center: Option<GeoPoint>,
    pub initial_radius_km: u32,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            center: None,
            initial_radius_km: DEFAULT_RADIUS_KM,
            city: None,
            state: None,
        }
    }
}

impl SearchRequest {
    #[must_use]
    pub fn near(latitude: f64, longitude: f64) -> Self {
        Self {
            center: Some(GeoPoint::new(latitude, longitude)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_locality(city: Option<&str>, state: &str) -> Self {
        Self {
            city: city.map(ToString::to_string),
            state: Some(state.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn radius_km(mut self, radius_km: u32) -> Self {
        self.initial_radius_km = radius_km;
        self
    }

    #[must_use]
    pub fn in_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    #[must_use]
    pub fn in_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Reject requests that name neither a point nor a state.
    ///
    /// Searching never calls this: an underspecified request simply finds
    /// nothing. Callers that want a hard error check first.
    pub fn validate(&self) -> Result<()> {
        let has_center = self.center.is_some();
        let has_state = self.state.as_deref().is_some_and(|s| !s.trim().is_empty());
        if has_center || has_state {
            Ok(())
        } else {
            Err(VicinityError::UnderspecifiedQuery)
        }
    }
}

/// Raw, untyped request parameters as a transport layer receives them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub radius_km: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl SearchParams {
    /// Parse using [`DEFAULT_RADIUS_KM`] as the fallback radius.
    pub fn parse(&self) -> Result<SearchRequest> {
        self.parse_with_default_radius(DEFAULT_RADIUS_KM)
    }

    /// Turn raw parameters into a [`SearchRequest`].
    ///
    /// - Both `lat` and `lon`, or a `state`, must be present.
    /// - Coordinates must be numbers within WGS84 bounds; they are only read
    ///   when both are present.
    /// - A negative radius is rejected. A missing or non-integer radius falls
    ///   back to `default_radius_km` without error.
    /// - Blank `city`/`state` count as absent.
    pub fn parse_with_default_radius(&self, default_radius_km: u32) -> Result<SearchRequest> {
        let lat = non_blank(self.lat.as_deref());
        let lon = non_blank(self.lon.as_deref());
        let state = non_blank(self.state.as_deref());

        let center = match (lat, lon) {
            (Some(lat), Some(lon)) => Some(GeoPoint::try_new(
                parse_coordinate("lat", lat)?,
                parse_coordinate("lon", lon)?,
            )?),
            _ => None,
        };
        if center.is_none() && state.is_none() {
            return Err(VicinityError::UnderspecifiedQuery);
        }

        Ok(SearchRequest {
            center,
            initial_radius_km: parse_radius(self.radius_km.as_deref(), default_radius_km)?,
            city: non_blank(self.city.as_deref()).map(ToString::to_string),
            state: state.map(ToString::to_string),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_coordinate(name: &'static str, raw: &str) -> Result<f64> {
    raw.parse().map_err(|_| VicinityError::InvalidParameter {
        name,
        reason: format!("'{raw}' is not a number"),
    })
}

fn parse_radius(raw: Option<&str>, default_radius_km: u32) -> Result<u32> {
    let Some(raw) = non_blank(raw) else {
        return Ok(default_radius_km);
    };
    match raw.parse::<i64>() {
        Ok(radius) if radius < 0 => Err(VicinityError::InvalidParameter {
            name: "radius_km",
            reason: "radius_km cannot be negative".to_string(),
        }),
        Ok(radius) => u32::try_from(radius).map_err(|_| VicinityError::InvalidParameter {
            name: "radius_km",
            reason: format!("{radius} is too large"),
        }),
        Err(_) => {
            debug!(raw, default_radius_km, "Unreadable radius, using default");
            Ok(default_radius_km)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(lat: &str, lon: &str, radius: &str, city: &str, state: &str) -> SearchParams {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        SearchParams {
            lat: opt(lat),
            lon: opt(lon),
            radius_km: opt(radius),
            city: opt(city),
            state: opt(state),
        }
    }

    #[test]
    fn test_parse_point_request() {
        let request = params("40.0", "-73.0", "5", "", "").parse().unwrap();
        assert_eq!(request.center, Some(GeoPoint::new(40.0, -73.0)));
        assert_eq!(request.initial_radius_km, 5);
        assert_eq!(request.state, None);
    }

    #[test]
    fn test_parse_locality_request() {
        let request = params("", "", "", " Springfield ", "IL").parse().unwrap();
        assert_eq!(request.center, None);
        assert_eq!(request.initial_radius_km, DEFAULT_RADIUS_KM);
        assert_eq!(request.city.as_deref(), Some("Springfield"));
        assert_eq!(request.state.as_deref(), Some("IL"));
    }

    #[test]
    fn test_underspecified() {
        for p in [
            params("", "", "", "", ""),
            params("40.0", "", "", "Springfield", ""),
            params("", "", "5", "Springfield", "   "),
        ] {
            let err = p.parse().unwrap_err();
            assert!(matches!(err, VicinityError::UnderspecifiedQuery), "{p:?}");
            assert!(err.is_client_error());
        }
    }

    #[test]
    fn test_half_a_point_with_state_is_locality_only() {
        let request = params("40.0", "", "", "", "NY").parse().unwrap();
        assert_eq!(request.center, None);
    }

    #[test]
    fn test_bad_coordinates_rejected() {
        assert!(matches!(
            params("north", "-73.0", "", "", "").parse(),
            Err(VicinityError::InvalidParameter { name: "lat", .. })
        ));
        assert!(matches!(
            params("40.0", "200", "", "", "").parse(),
            Err(VicinityError::InvalidParameter { name: "lon", .. })
        ));
    }

    #[test]
    fn test_negative_radius_rejected() {
        let err = params("40.0", "-73.0", "-5", "", "").parse().unwrap_err();
        assert!(matches!(
            err,
            VicinityError::InvalidParameter {
                name: "radius_km",
                ..
            }
        ));
    }

    #[test]
    fn test_unreadable_radius_falls_back() {
        for radius in ["abc", "2.5", ""] {
            let request = params("40.0", "-73.0", radius, "", "").parse().unwrap();
            assert_eq!(request.initial_radius_km, DEFAULT_RADIUS_KM, "radius '{radius}'");
        }
        let request = params("40.0", "-73.0", "ten", "", "")
            .parse_with_default_radius(7)
            .unwrap();
        assert_eq!(request.initial_radius_km, 7);
    }

    #[test]
    fn test_validate() {
        assert!(SearchRequest::near(40.0, -73.0).validate().is_ok());
        assert!(SearchRequest::in_locality(None, "IL").validate().is_ok());
        assert!(matches!(
            SearchRequest::default().validate(),
            Err(VicinityError::UnderspecifiedQuery)
        ));
        assert!(SearchRequest::default().in_state(" ").validate().is_err());
    }
}
