//! KML 2.2 rendering of an extracted trajectory.
//!
//! One placemark per track point, styled by its marker, followed by a
//! LineString placemark connecting all points.

use crate::config::{ConversionConfig, KmlStyle};
use crate::constants;
use crate::error::Result;
use crate::models::{Marker, PointSource, Scalar, TrackPoint, Trajectory};
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

/// `N39.5 E2.7` style position label
pub fn position_label(latitude: Scalar, longitude: Scalar) -> String {
    let ns = if latitude.as_f64() < 0.0 { 'S' } else { 'N' };
    let ew = if longitude.as_f64() < 0.0 { 'W' } else { 'E' };
    format!("{}{} {}{}", ns, latitude.abs(), ew, longitude.abs())
}

fn coordinate_text(longitude: Scalar, latitude: Scalar) -> String {
    format!("{},{}", longitude, latitude)
}

pub struct KmlRenderer<'a> {
    style: &'a KmlStyle,
    thredds_link: Option<&'a str>,
}

impl<'a> KmlRenderer<'a> {
    pub fn new(config: &'a ConversionConfig) -> Self {
        Self {
            style: &config.style,
            thredds_link: config.thredds_link.as_deref(),
        }
    }

    /// Balloon HTML of a point
    pub fn description(&self, title: &str, point: &TrackPoint) -> String {
        let mut html = format!("<h3>{}</h3><br>", title);
        if let PointSource::Sample { .. } = point.source {
            html.push_str(&format!(
                " <strong>Time: </strong>{}<br>",
                point.begin.format(&self.style.date_format)
            ));
        }
        html.push_str(&format!(
            " <strong>Position: </strong>{}<br>",
            position_label(point.latitude, point.longitude)
        ));
        for field in &point.fields {
            html.push_str(&format!("<br><strong>{}: </strong>{}", field.name, field.value));
        }
        if let Some(link) = self.thredds_link {
            html.push_str(&format!(
                "<br> <strong>TDS link:</strong> <a href=\"{}\" title=\"OPeNDAP link\"> OPeNDAP link</a>",
                link
            ));
        }
        html
    }

    pub fn render(&self, trajectory: &Trajectory) -> Result<String> {
        let mut buffer = Vec::new();
        self.write(trajectory, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    pub fn write_file(&self, trajectory: &Trajectory, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write(trajectory, &mut out)?;
        out.flush()?;
        debug!("Wrote {} placemarks to {}", trajectory.points.len(), path.display());
        Ok(())
    }

    pub fn write<W: Write>(&self, trajectory: &Trajectory, out: W) -> Result<()> {
        let mut writer = Writer::new_with_indent(out, b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(
            BytesStart::new("kml").with_attributes([("xmlns", KML_NAMESPACE)]),
        ))?;
        writer.write_event(Event::Start(BytesStart::new("Document")))?;
        text_element(&mut writer, "name", &trajectory.title)?;
        text_element(&mut writer, "open", "1")?;

        self.write_icon_style(&mut writer, constants::HOME_STYLE_ID, &self.style.home_icon_url)?;
        self.write_icon_style(
            &mut writer,
            constants::REGULAR_STYLE_ID,
            &self.style.regular_icon_url,
        )?;
        self.write_icon_style(&mut writer, constants::FINAL_STYLE_ID, &self.style.end_icon_url)?;

        writer.write_event(Event::Start(
            BytesStart::new("Style").with_attributes([("id", constants::LINE_STYLE_ID)]),
        ))?;
        self.write_line_style(&mut writer)?;
        writer.write_event(Event::End(BytesEnd::new("Style")))?;

        for point in &trajectory.points {
            self.write_placemark(&mut writer, &trajectory.title, point)?;
        }
        self.write_path(&mut writer, trajectory)?;

        writer.write_event(Event::End(BytesEnd::new("Document")))?;
        writer.write_event(Event::End(BytesEnd::new("kml")))?;
        Ok(())
    }

    fn write_line_style<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_event(Event::Start(BytesStart::new("LineStyle")))?;
        text_element(writer, "color", &self.style.line_color)?;
        text_element(writer, "width", &self.style.line_width.to_string())?;
        writer.write_event(Event::End(BytesEnd::new("LineStyle")))?;
        Ok(())
    }

    fn write_icon_style<W: Write>(&self, writer: &mut Writer<W>, id: &str, href: &str) -> Result<()> {
        writer.write_event(Event::Start(
            BytesStart::new("Style").with_attributes([("id", id)]),
        ))?;
        self.write_line_style(writer)?;

        writer.write_event(Event::Start(BytesStart::new("BalloonStyle")))?;
        text_element(writer, "bgColor", constants::BALLOON_BG_COLOR)?;
        text_element(writer, "textColor", constants::BALLOON_TEXT_COLOR)?;
        writer.write_event(Event::End(BytesEnd::new("BalloonStyle")))?;

        writer.write_event(Event::Start(BytesStart::new("IconStyle")))?;
        text_element(writer, "color", constants::ICON_COLOR)?;
        text_element(writer, "scale", &constants::ICON_SCALE.to_string())?;
        writer.write_event(Event::Start(BytesStart::new("Icon")))?;
        text_element(writer, "href", href)?;
        writer.write_event(Event::End(BytesEnd::new("Icon")))?;
        writer.write_event(Event::End(BytesEnd::new("IconStyle")))?;

        writer.write_event(Event::End(BytesEnd::new("Style")))?;
        Ok(())
    }

    fn write_placemark<W: Write>(
        &self,
        writer: &mut Writer<W>,
        title: &str,
        point: &TrackPoint,
    ) -> Result<()> {
        writer.write_event(Event::Start(BytesStart::new("Placemark")))?;

        writer.write_event(Event::Start(BytesStart::new("description")))?;
        writer.write_event(Event::CData(BytesCData::new(self.description(title, point))))?;
        writer.write_event(Event::End(BytesEnd::new("description")))?;

        let style_id = match point.marker {
            Marker::Start => constants::HOME_STYLE_ID,
            Marker::Regular => constants::REGULAR_STYLE_ID,
            Marker::End => constants::FINAL_STYLE_ID,
        };
        text_element(writer, "styleUrl", &format!("#{}", style_id))?;

        writer.write_event(Event::Start(BytesStart::new("TimeSpan")))?;
        text_element(
            writer,
            "begin",
            &point.begin.format(constants::TIME_SPAN_FORMAT).to_string(),
        )?;
        if let Some(end) = point.end {
            text_element(writer, "end", &end.format(constants::TIME_SPAN_FORMAT).to_string())?;
        }
        writer.write_event(Event::End(BytesEnd::new("TimeSpan")))?;

        writer.write_event(Event::Start(BytesStart::new("Point")))?;
        text_element(
            writer,
            "coordinates",
            &coordinate_text(point.longitude, point.latitude),
        )?;
        writer.write_event(Event::End(BytesEnd::new("Point")))?;

        writer.write_event(Event::End(BytesEnd::new("Placemark")))?;
        Ok(())
    }

    fn write_path<W: Write>(&self, writer: &mut Writer<W>, trajectory: &Trajectory) -> Result<()> {
        let coordinates = trajectory
            .path
            .iter()
            .map(|&(lon, lat)| coordinate_text(lon, lat))
            .collect::<Vec<_>>()
            .join(" ");

        writer.write_event(Event::Start(BytesStart::new("Placemark")))?;
        text_element(writer, "name", &trajectory.title)?;
        text_element(writer, "styleUrl", &format!("#{}", constants::LINE_STYLE_ID))?;
        writer.write_event(Event::Start(BytesStart::new("LineString")))?;
        text_element(writer, "extrude", "0")?;
        text_element(writer, "tessellate", "1")?;
        text_element(writer, "coordinates", &coordinates)?;
        writer.write_event(Event::End(BytesEnd::new("LineString")))?;
        writer.write_event(Event::End(BytesEnd::new("Placemark")))?;
        Ok(())
    }
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
