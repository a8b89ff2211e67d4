//! Built-in cell functions
//!
//! Styling functions apply their change and then write the value into the
//! cell unchanged.

use std::path::Path;

use cellplate_core::{
    BorderLineStyle, BorderStyle, CellMut, CellValue, Color, FillStyle, HorizontalAlignment,
    Hyperlink, NumberFormat, PictureSource, Underline,
};
use tracing::debug;

use crate::error::{HandlerError, HandlerResult};
use crate::value::Value;

/// `bold`: bold font
pub fn bold(cell: &mut CellMut<'_>, value: &Value, _parameters: &[String]) -> HandlerResult<()> {
    cell.style_mut().font.bold = true;
    cell.set_value(value.to_cell_value());
    Ok(())
}

/// `italic`: italic font
pub fn italic(cell: &mut CellMut<'_>, value: &Value, _parameters: &[String]) -> HandlerResult<()> {
    cell.style_mut().font.italic = true;
    cell.set_value(value.to_cell_value());
    Ok(())
}

/// `color(name|hex)`: font color; unknown colors fall back to black
pub fn color(cell: &mut CellMut<'_>, value: &Value, parameters: &[String]) -> HandlerResult<()> {
    if let Some(spec) = parameters.first() {
        cell.style_mut().font.color = Color::parse(spec).unwrap_or(Color::BLACK);
    }
    cell.set_value(value.to_cell_value());
    Ok(())
}

/// `background(name|hex)`: solid background; unknown colors leave the fill alone
pub fn background(
    cell: &mut CellMut<'_>,
    value: &Value,
    parameters: &[String],
) -> HandlerResult<()> {
    if let Some(color) = parameters.first().and_then(|spec| Color::parse(spec)) {
        cell.style_mut().fill = FillStyle::solid(color);
    }
    cell.set_value(value.to_cell_value());
    Ok(())
}

/// `center`: center horizontally
pub fn center(cell: &mut CellMut<'_>, value: &Value, _parameters: &[String]) -> HandlerResult<()> {
    cell.style_mut().alignment.horizontal = HorizontalAlignment::Center;
    cell.set_value(value.to_cell_value());
    Ok(())
}

/// `border(style = thin)`: outline all four sides
pub fn border(cell: &mut CellMut<'_>, value: &Value, parameters: &[String]) -> HandlerResult<()> {
    let style = parameters
        .first()
        .and_then(|name| BorderLineStyle::from_name(name))
        .unwrap_or(BorderLineStyle::Thin);
    cell.style_mut().border = BorderStyle::outline(style, Color::BLACK);
    cell.set_value(value.to_cell_value());
    Ok(())
}

/// `format(code)`: set the cell's number format
pub fn format(cell: &mut CellMut<'_>, value: &Value, parameters: &[String]) -> HandlerResult<()> {
    if let Some(code) = parameters.first() {
        cell.style_mut().number_format = NumberFormat::from_string(code.as_str());
    }
    cell.set_value(value.to_cell_value());
    Ok(())
}

/// `link(text?)`: hyperlink to the value
///
/// Values starting with `#` or containing `!` link inside the workbook;
/// anything else is an external URL, with `http://` added when no scheme is
/// given. The cell shows `text`, or the link target when no text is given.
pub fn link(cell: &mut CellMut<'_>, value: &Value, parameters: &[String]) -> HandlerResult<()> {
    if value.is_null() {
        cell.set_value(CellValue::Empty);
        return Ok(());
    }

    let target = value.to_string();
    let text = parameters.first().cloned().unwrap_or_else(|| target.clone());

    let hyperlink = if target.starts_with('#') || target.contains('!') {
        Hyperlink::internal(target)
    } else if target.starts_with("http://") || target.starts_with("https://") {
        Hyperlink::external(target)
    } else {
        Hyperlink::external(format!("http://{}", target))
    };

    cell.set_value(text);
    cell.set_hyperlink(hyperlink);
    let font = &mut cell.style_mut().font;
    font.underline = Underline::Single;
    font.color = Color::HYPERLINK;
    Ok(())
}

/// `image(width=, height=, scale=)`: place a picture over the cell
///
/// The value is image bytes or a path to an existing file. Sizes are in
/// pixels and `scale` is a percentage. The cell's value is cleared so the
/// picture is not drawn over text.
pub fn image(cell: &mut CellMut<'_>, value: &Value, parameters: &[String]) -> HandlerResult<()> {
    let source = match value {
        Value::Null => return Ok(()),
        Value::Bytes(bytes) => PictureSource::Bytes(bytes.clone()),
        other => {
            let path = other.to_string();
            if Path::new(&path).is_file() {
                PictureSource::Path(path.into())
            } else if path.contains("://") {
                return Err(HandlerError::new(
                    "URL images are not supported directly. \
                     Download the image first and then use the file path.",
                ));
            } else {
                debug!(cell = %cell.key(), path = %path, "image path not found");
                cell.set_value("Invalid image path");
                return Ok(());
            }
        }
    };

    let picture = cell.add_picture(source);
    for parameter in parameters {
        let Some((name, size)) = parameter.split_once('=') else {
            continue;
        };
        let Ok(size) = size.trim().parse::<i64>() else {
            continue;
        };
        match name.trim().to_lowercase().as_str() {
            "width" => picture.width = u32::try_from(size).ok(),
            "height" => picture.height = u32::try_from(size).ok(),
            "scale" => picture.scale = Some(size as f64 / 100.0),
            _ => {}
        }
    }

    cell.clear_value();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellplate_core::{CellAddress, Worksheet};
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn params(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_font_functions() {
        let mut sheet = Worksheet::new("Sheet1");
        let mut cell = sheet.cell_mut_at(0, 0);
        bold(&mut cell, &Value::from("john"), &[]).unwrap();
        italic(&mut cell, &Value::from("john"), &[]).unwrap();
        assert_eq!(cell.value(), CellValue::string("john"));
        assert!(cell.style().font.bold);
        assert!(cell.style().font.italic);
    }

    #[test]
    fn test_color_functions() {
        let mut sheet = Worksheet::new("Sheet1");
        let mut cell = sheet.cell_mut_at(0, 0);
        color(&mut cell, &Value::from(5), &params(&["red"])).unwrap();
        assert_eq!(cell.style().font.color, Color::RED);
        assert_eq!(cell.value(), CellValue::Number(5.0));

        color(&mut cell, &Value::from(5), &params(&["#00FF00"])).unwrap();
        assert_eq!(cell.style().font.color, Color::rgb(0, 255, 0));

        color(&mut cell, &Value::from(5), &params(&["not a color"])).unwrap();
        assert_eq!(cell.style().font.color, Color::BLACK);

        background(&mut cell, &Value::from(5), &params(&["yellow"])).unwrap();
        assert_eq!(cell.style().fill, FillStyle::solid(Color::YELLOW));
        background(&mut cell, &Value::from(5), &params(&["zzz"])).unwrap();
        assert_eq!(cell.style().fill, FillStyle::solid(Color::YELLOW));
    }

    #[test]
    fn test_layout_functions() {
        let mut sheet = Worksheet::new("Sheet1");
        let mut cell = sheet.cell_mut_at(0, 0);
        center(&mut cell, &Value::from("x"), &[]).unwrap();
        assert_eq!(cell.style().alignment.horizontal, HorizontalAlignment::Center);

        border(&mut cell, &Value::from("x"), &params(&["Thick"])).unwrap();
        let edge = cell.style().border.left.unwrap();
        assert_eq!(edge.style, BorderLineStyle::Thick);

        border(&mut cell, &Value::from("x"), &params(&["wavy"])).unwrap();
        assert_eq!(cell.style().border.top.unwrap().style, BorderLineStyle::Thin);

        format(&mut cell, &Value::from(1.5), &params(&["0.00%"])).unwrap();
        assert_eq!(cell.style().number_format.code(), "0.00%");
        assert_eq!(cell.value(), CellValue::Number(1.5));
    }

    #[test]
    fn test_link() {
        let mut sheet = Worksheet::new("Sheet1");
        let mut cell = sheet.cell_mut_at(0, 0);
        link(&mut cell, &Value::from("example.com"), &params(&["Example"])).unwrap();
        assert_eq!(cell.value(), CellValue::string("Example"));
        assert_eq!(
            cell.hyperlink(),
            Some(&Hyperlink::External("http://example.com".into()))
        );
        assert_eq!(cell.style().font.underline, Underline::Single);
        assert_eq!(cell.style().font.color, Color::HYPERLINK);

        let mut cell = sheet.cell_mut_at(1, 0);
        link(&mut cell, &Value::from("Summary!A1"), &[]).unwrap();
        assert_eq!(cell.value(), CellValue::string("Summary!A1"));
        assert_eq!(cell.hyperlink(), Some(&Hyperlink::Internal("Summary!A1".into())));

        let mut cell = sheet.cell_mut_at(2, 0);
        link(&mut cell, &Value::from("https://x.org"), &[]).unwrap();
        assert_eq!(cell.hyperlink(), Some(&Hyperlink::External("https://x.org".into())));
    }

    #[test]
    fn test_image_from_bytes() {
        let mut sheet = Worksheet::new("Sheet1");
        {
            let mut cell = sheet.cell_mut_at(3, 2);
            cell.set_value("{{Logo|image}}");
            image(
                &mut cell,
                &Value::Bytes(vec![0x89, 0x50]),
                &params(&["width=120", "height = 40", "scale=50", "bogus"]),
            )
            .unwrap();
            assert_eq!(cell.value(), CellValue::Empty);
        }
        let picture = &sheet.pictures()[0];
        assert_eq!(picture.anchor, CellAddress::new(3, 2));
        assert_eq!(picture.width, Some(120));
        assert_eq!(picture.height, Some(40));
        assert_eq!(picture.scale, Some(0.5));
    }

    #[test]
    fn test_image_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not really a png").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let mut sheet = Worksheet::new("Sheet1");
        let mut cell = sheet.cell_mut_at(0, 0);
        image(&mut cell, &Value::from(path.clone()), &[]).unwrap();
        drop(cell);
        assert_eq!(
            sheet.pictures()[0].source,
            PictureSource::Path(path.into())
        );
    }

    #[test]
    fn test_image_bad_sources() {
        let mut sheet = Worksheet::new("Sheet1");
        let mut cell = sheet.cell_mut_at(0, 0);
        image(&mut cell, &Value::from("/no/such/file.png"), &[]).unwrap();
        assert_eq!(cell.value(), CellValue::string("Invalid image path"));

        let err = image(&mut cell, &Value::from("https://x.org/a.png"), &[]).unwrap_err();
        assert!(err.message().starts_with("URL images are not supported"));
        drop(cell);
        assert!(sheet.pictures().is_empty());
    }
}
